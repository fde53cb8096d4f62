//! The execution context of a Network: it owns the framework variables, creates them from their
//! specs the first time they are needed and runs the train op.

use std::collections::HashMap;

use candle_core::{Device, Tensor, Var};
use log::info;

use crate::{
    layers::VariableSpec,
    optimizers::{Optimizer, TrainOp},
    saver::SavedVariable,
    types::SessionError,
};

#[derive(Debug, Clone, Default)]
/// The variables of a Session in the order they were created.
pub struct Variables {
    names: Vec<String>,
    by_name: HashMap<String, Var>,
}

impl Variables {
    fn insert(&mut self, name: String, var: Var) {
        if self.by_name.insert(name.clone(), var).is_none() {
            self.names.push(name);
        }
    }

    /// The variable with some name.
    pub fn get(&self, name: &str) -> Option<&Var> {
        self.by_name.get(name)
    }

    /// Every variable in creation order.
    pub fn all(&self) -> Vec<Var> {
        self.names
            .iter()
            .filter_map(|name| self.by_name.get(name).cloned())
            .collect()
    }

    /// The names of the variables in creation order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The amount of variables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Weather or not there are no variables.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug)]
/// A Session is opened by `set_optimizer` and lives until the Network is closed.
pub struct Session {
    device: Device,
    optimizer: Optimizer,
    variables: Option<Variables>,
    train_op: Option<TrainOp>,
    closed: bool,
}

impl Session {
    /// Opens a new Session that will train with some optimizer.
    pub fn new(optimizer: Optimizer, device: Device) -> Self {
        info!(
            "opening a session with a learning rate of {}",
            optimizer.learning_rate()
        );

        Session {
            device,
            optimizer,
            variables: None,
            train_op: None,
            closed: false,
        }
    }

    /// The device every tensor of the Session lives on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The optimizer of the Session.
    pub fn optimizer(&self) -> &Optimizer {
        &self.optimizer
    }

    /// Weather or not the variables were already created.
    pub fn is_initialized(&self) -> bool {
        self.variables.is_some()
    }

    /// Weather or not the Session was closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    /// Creates every variable, either from its initializer or from a restored value with the same
    /// name, and binds the optimizer to them.
    pub fn initialize_all_variables(
        &mut self,
        specs: &[&VariableSpec],
        restored: Option<&HashMap<String, SavedVariable>>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;

        let mut variables = Variables::default();
        let mut restored_amount = 0;

        for spec in specs {
            let values = match restored.and_then(|restored| restored.get(&spec.name)) {
                Some(saved) => {
                    if saved.shape != spec.shape {
                        return Err(SessionError::RestoredShapeMismatch {
                            name: spec.name.clone(),
                            expected: spec.shape.clone(),
                            found: saved.shape.clone(),
                        });
                    }
                    restored_amount += 1;
                    saved.values.clone()
                }
                None => spec.initial_values(),
            };

            let var = Var::from_tensor(&Tensor::from_vec(
                values,
                spec.shape.as_slice(),
                &self.device,
            )?)?;
            variables.insert(spec.name.clone(), var);
        }

        info!(
            "initialized {} variables, {} of them restored",
            variables.len(),
            restored_amount
        );

        self.train_op = Some(self.optimizer.minimize(variables.all())?);
        self.variables = Some(variables);

        Ok(())
    }

    /// The variables of the Session.
    pub fn variables(&self) -> Result<&Variables, SessionError> {
        self.ensure_open()?;
        self.variables.as_ref().ok_or(SessionError::NotInitialized)
    }

    /// Runs the train op on a loss: backward pass and one optimizer update.
    pub fn minimize(&mut self, loss: &Tensor) -> Result<(), SessionError> {
        self.ensure_open()?;
        let train_op = self
            .train_op
            .as_mut()
            .ok_or(SessionError::NotInitialized)?;

        train_op.backward_step(loss)?;

        Ok(())
    }

    /// The current value of some variable.
    pub fn fetch(&self, name: &str) -> Result<Tensor, SessionError> {
        self.variables()?
            .get(name)
            .map(|var| var.as_tensor().clone())
            .ok_or_else(|| SessionError::MissingVariable(name.to_string()))
    }

    /// Closes the Session, dropping its variables. Every later run fails.
    pub fn close(&mut self) {
        if !self.closed {
            info!("closing the session");
        }

        self.closed = true;
        self.variables = None;
        self.train_op = None;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use candle_core::Device;

    use super::Session;
    use crate::{
        layers::{initializers::Fan, Initializer, VariableSpec},
        optimizers::Optimizer,
        saver::SavedVariable,
        types::SessionError,
    };

    fn spec(name: &str, shape: Vec<usize>) -> VariableSpec {
        VariableSpec {
            name: name.to_string(),
            shape,
            initializer: Initializer::default(),
            fan: Fan::new(2, 3),
        }
    }

    #[test]
    fn should_create_variables_from_their_specs() {
        let weights = spec("hidden_layer_1/weights", vec![2, 3]);
        let biases = spec("hidden_layer_1/biases", vec![3]);
        let mut session = Session::new(Optimizer::default(), Device::Cpu);

        assert!(matches!(
            session.fetch("hidden_layer_1/weights"),
            Err(SessionError::NotInitialized)
        ));

        session
            .initialize_all_variables(&[&weights, &biases], None)
            .unwrap();

        assert_eq!(session.variables().unwrap().len(), 2);
        assert_eq!(
            session.fetch("hidden_layer_1/weights").unwrap().dims(),
            &[2, 3]
        );
        assert!(matches!(
            session.fetch("nope"),
            Err(SessionError::MissingVariable(_))
        ));
    }

    #[test]
    fn should_prefer_restored_values() {
        let biases = spec("output_layer/biases", vec![2]);
        let restored = HashMap::from([(
            "output_layer/biases".to_string(),
            SavedVariable {
                name: "output_layer/biases".to_string(),
                shape: vec![2],
                values: vec![4.0, 2.0],
            },
        )]);
        let mut session = Session::new(Optimizer::default(), Device::Cpu);

        session
            .initialize_all_variables(&[&biases], Some(&restored))
            .unwrap();

        assert_eq!(
            session
                .fetch("output_layer/biases")
                .unwrap()
                .to_vec1::<f32>()
                .unwrap(),
            vec![4.0, 2.0]
        );
    }

    #[test]
    fn should_refuse_restored_values_of_another_shape() {
        let biases = spec("output_layer/biases", vec![3]);
        let restored = HashMap::from([(
            "output_layer/biases".to_string(),
            SavedVariable {
                name: "output_layer/biases".to_string(),
                shape: vec![2],
                values: vec![4.0, 2.0],
            },
        )]);
        let mut session = Session::new(Optimizer::default(), Device::Cpu);

        assert!(matches!(
            session.initialize_all_variables(&[&biases], Some(&restored)),
            Err(SessionError::RestoredShapeMismatch { .. })
        ));
    }

    #[test]
    fn closed_sessions_should_refuse_everything() {
        let biases = spec("output_layer/biases", vec![3]);
        let mut session = Session::new(Optimizer::default(), Device::Cpu);
        session.initialize_all_variables(&[&biases], None).unwrap();

        session.close();

        assert!(session.is_closed());
        assert!(matches!(
            session.fetch("output_layer/biases"),
            Err(SessionError::Closed)
        ));
        assert!(matches!(
            session.initialize_all_variables(&[&biases], None),
            Err(SessionError::Closed)
        ));
    }
}
