//! The persisted unit of an annotation session.
//!
//! # File Format
//!
//! ```json
//! {
//!   "current_crop_index": 3,
//!   "current_probe_directory": "20180430030003_A050570",
//!   "internal_boxes": {
//!     "20180430030003_A050570/images/polle-im_01_05_22-...-tiffRAW.png": {
//!       "manual_boxes": [[[10, 20, 40, 60], "Betula"]],
//!       "existing_boxes": [[[0, 0, 12, 12], "Pinus"]]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::BoxSet;

/// Resumable session state: position plus every visited crop's boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_crop_index: usize,
    pub current_probe_directory: String,
    /// Boxes per visited crop, keyed by `<directory>/images/<crop name>`.
    #[serde(default)]
    pub internal_boxes: BTreeMap<String, BoxSet>,
}

impl SessionState {
    /// State of a session that has not visited anything yet.
    pub fn fresh(directory: impl Into<String>) -> Self {
        Self {
            current_crop_index: 0,
            current_probe_directory: directory.into(),
            internal_boxes: BTreeMap::new(),
        }
    }

    /// Total box count across all visited crops.
    pub fn total_boxes(&self) -> usize {
        self.internal_boxes.values().map(BoxSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabeledBox, Rectangle};

    #[test]
    fn test_reads_session_file_layout() {
        let json = r#"{
            "current_crop_index": 2,
            "current_probe_directory": "d_1",
            "internal_boxes": {
                "d_1/images/t1": {
                    "manual_boxes": [[[2, 2, 3, 3], "Betula"]],
                    "existing_boxes": [[[0, 0, 1, 1], "Pinus"]]
                }
            }
        }"#;

        let state: SessionState = serde_json::from_str(json).unwrap();
        assert_eq!(state.current_crop_index, 2);
        assert_eq!(state.current_probe_directory, "d_1");
        let boxes = &state.internal_boxes["d_1/images/t1"];
        assert_eq!(boxes.manual, vec![LabeledBox::new(Rectangle::new(2, 2, 3, 3), "Betula")]);
        assert_eq!(boxes.existing, vec![LabeledBox::new(Rectangle::new(0, 0, 1, 1), "Pinus")]);
        assert_eq!(state.total_boxes(), 2);
    }

    #[test]
    fn test_fresh_state() {
        let state = SessionState::fresh("d_1");
        assert_eq!(state.current_crop_index, 0);
        assert!(state.internal_boxes.is_empty());

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"current_crop_index":0,"current_probe_directory":"d_1","internal_boxes":{}}"#
        );
    }
}
