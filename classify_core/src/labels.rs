use crate::config::{LabelsConfig, Validatable};
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

/// Class names indexed by class id. Lookup is cosmetic, so an incomplete set
/// only means some ids are shown without a name.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn load(filepath: &Path) -> io::Result<Self> {
        let file = File::open(filepath)?;
        let reader = io::BufReader::new(file);
        let mut labels = Vec::new();

        for line_result in reader.lines() {
            let line = line_result?;
            labels.push(line.trim().to_string());
        }

        // trailing blank lines are not classes
        while labels.last().is_some_and(|label| label.is_empty()) {
            labels.pop();
        }

        Ok(Self { labels })
    }

    pub fn from_config(labels_cfg: Option<&LabelsConfig>) -> Self {
        let Some(labels_cfg) = labels_cfg else {
            return Self::default();
        };

        match Self::load(&labels_cfg.get_path()) {
            Ok(labels) => {
                tracing::info!("Loaded {} class labels", labels.len());
                labels
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load labels from {:?}, showing class ids only: {}",
                    labels_cfg.get_path(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.labels
            .get(class_id as usize)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    pub fn describe(&self, class_id: u32) -> String {
        match self.get(class_id) {
            Some(label) => format!("{} ({})", class_id, label),
            None => class_id.to_string(),
        }
    }
}
