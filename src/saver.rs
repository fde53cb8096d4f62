//! Persisting a Network to disk and bringing it back.
//!
//! A saved Network is a savefile holding its sizes, its layers as they were built, the current
//! values of every variable, its normalizer and its global step.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use log::info;
use savefile_derive::Savefile;

use crate::{
    datasets::Normalizer,
    network::Network,
    types::{NetworkError, NetworkLayer, NetworkType, Regularization, SaveError},
};

/// The version written to and expected from every saved Network.
pub const SAVE_VERSION: u32 = 0;

/// The extension of saved Networks.
pub const SAVE_EXTENSION: &str = "tfnn";

/// The directory Networks are saved to when no path is given.
pub const DEFAULT_SAVE_DIR: &str = "saved_networks";

#[derive(Debug, Clone, PartialEq, Savefile)]
/// The values of one variable at the time it was saved.
pub struct SavedVariable {
    /// The name of the variable.
    pub name: String,
    /// The shape of the variable.
    pub shape: Vec<usize>,
    /// Every value in row major order.
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Savefile)]
/// Everything needed to bring a Network back.
pub struct NetworkSnapshot {
    /// The amount of inputs per sample.
    pub input_size: usize,
    /// The amount of outputs per sample.
    pub output_size: usize,
    /// The regularization mode.
    pub regularization: Regularization,
    /// The network type.
    pub network_type: NetworkType,
    /// The layers after the input layer with the options they were built with.
    pub layers: Vec<NetworkLayer>,
    /// The variable values.
    pub variables: Vec<SavedVariable>,
    /// The feature scaling of the Network.
    pub normalizer: Normalizer,
    /// The amount of training steps run so far.
    pub global_step: usize,
}

impl NetworkSnapshot {
    /// The variable values by name.
    pub fn variables_by_name(&self) -> HashMap<String, SavedVariable> {
        self.variables
            .iter()
            .map(|variable| (variable.name.clone(), variable.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
/// Saves Networks under a directory and restores them.
pub struct NetworkSaver {
    default_dir: PathBuf,
}

impl Default for NetworkSaver {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DIR)
    }
}

impl NetworkSaver {
    /// Creates a saver that uses `default_dir` when no path is given.
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        NetworkSaver {
            default_dir: default_dir.into(),
        }
    }

    /// The file a Network would be saved to, `<dir>/<name>[-<global_step>].tfnn`.
    pub fn target_path(&self, name: &str, path: Option<&Path>, global_step: Option<usize>) -> PathBuf {
        let file_name = match global_step {
            Some(step) => format!("{}-{}.{}", name, step, SAVE_EXTENSION),
            None => format!("{}.{}", name, SAVE_EXTENSION),
        };

        path.unwrap_or(self.default_dir.as_path()).join(file_name)
    }

    /// Saves a Network, its variables must be initialized.
    ///
    /// Gives back the path of the file written.
    pub fn save(
        &self,
        network: &Network,
        name: &str,
        path: Option<&Path>,
        global_step: Option<usize>,
        replace: bool,
    ) -> Result<PathBuf, NetworkError> {
        let target = self.target_path(name, path, global_step);

        if target.exists() && !replace {
            return Err(SaveError::AlreadyExists(target).into());
        }

        let snapshot = network.snapshot()?;

        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(SaveError::from)?;
        }

        let mut writer = BufWriter::new(File::create(&target).map_err(SaveError::from)?);
        savefile::save(&mut writer, SAVE_VERSION, &snapshot).map_err(SaveError::from)?;

        info!(
            "saved {} variables to {}",
            snapshot.variables.len(),
            target.display()
        );

        Ok(target)
    }

    /// Brings back a saved Network. Its layers get constructed again and the saved values are
    /// used when its variables are initialized, after an optimizer is set.
    pub fn restore(path: impl AsRef<Path>) -> Result<Network, NetworkError> {
        let path = path.as_ref();

        let mut reader = BufReader::new(File::open(path).map_err(SaveError::from)?);
        let snapshot: NetworkSnapshot =
            savefile::load(&mut reader, SAVE_VERSION).map_err(SaveError::from)?;

        info!(
            "restoring {} layers and {} variables from {}",
            snapshot.layers.len(),
            snapshot.variables.len(),
            path.display()
        );

        Network::from_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::NetworkSaver;

    #[test]
    fn should_name_files_after_the_step() {
        let saver = NetworkSaver::default();

        assert_eq!(
            saver.target_path("xor", None, None),
            Path::new("saved_networks").join("xor.tfnn")
        );
        assert_eq!(
            saver.target_path("xor", Some(Path::new("elsewhere")), Some(300)),
            Path::new("elsewhere").join("xor-300.tfnn")
        );
    }
}
