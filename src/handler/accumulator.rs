//! Pass and fail buffers, and the classification rules that feed them.

use crate::config::{ProcessingMode, UseCols};
use crate::error::{DiagnosticKind, FailedItem, FailedPayload};
use crate::tree::TreeValue;

/// A unit (or element of a unit) that did not pass classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Result of classifying one decoded unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub passed: usize,
    pub rejections: Vec<Rejection>,
}

impl Classification {
    pub fn failed(&self) -> usize {
        self.rejections.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }
}

/// Records waiting for materialization and items waiting for the error sink.
///
/// Both buffers only grow through [`classify`](Accumulator::classify) and
/// [`reject`](Accumulator::reject); materialization drains them.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pass: Vec<TreeValue>,
    fail: Vec<FailedItem>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[TreeValue] {
        &self.pass
    }

    pub fn failed(&self) -> &[FailedItem] {
        &self.fail
    }

    pub fn pass_len(&self) -> usize {
        self.pass.len()
    }

    pub fn fail_len(&self) -> usize {
        self.fail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pass.is_empty() && self.fail.is_empty()
    }

    /// Put a decoded unit into the pass or fail buffer according to `mode`.
    ///
    /// An empty `data_key` is treated as absent.
    pub fn classify(
        &mut self,
        unit: TreeValue,
        mode: ProcessingMode,
        data_key: Option<&str>,
    ) -> Classification {
        let data_key = data_key.filter(|key| !key.is_empty());
        let mut outcome = Classification::default();
        match mode {
            ProcessingMode::Array => self.classify_array(unit, data_key, &mut outcome),
            ProcessingMode::Multiline | ProcessingMode::Object => {
                self.classify_record(unit, mode, data_key, &mut outcome)
            }
        }
        outcome
    }

    fn classify_array(&mut self, unit: TreeValue, data_key: Option<&str>, outcome: &mut Classification) {
        match (unit, data_key) {
            (TreeValue::Sequence(items), None) => {
                outcome.passed += items.len();
                self.pass.extend(items);
            }
            // A list root with a key keeps the elements that contain the key.
            (TreeValue::Sequence(items), Some(key)) => {
                for item in items {
                    if item.as_mapping().is_some() && item.get_path(key).is_some() {
                        self.pass.push(item);
                        outcome.passed += 1;
                    } else {
                        let message = format!("element has no key '{key}'");
                        self.fail_with(DiagnosticKind::MissingKey, item, message, outcome);
                    }
                }
            }
            (unit @ TreeValue::Mapping(_), Some(key)) => match unit.get_path(key) {
                Some(TreeValue::Sequence(_)) => {
                    if let Some(TreeValue::Sequence(items)) = unit.into_path(key) {
                        outcome.passed += items.len();
                        self.pass.extend(items);
                    }
                }
                Some(other) => {
                    let message = format!("value at '{key}' is a {}, expected a list", other.type_name());
                    self.fail_with(DiagnosticKind::TypeMismatch, unit, message, outcome);
                }
                None => {
                    let message = format!("unit has no key '{key}'");
                    self.fail_with(DiagnosticKind::MissingKey, unit, message, outcome);
                }
            },
            (unit, _) => {
                let message = format!("array mode expects a list, found a {}", unit.type_name());
                self.fail_with(DiagnosticKind::TypeMismatch, unit, message, outcome);
            }
        }
    }

    fn classify_record(
        &mut self,
        unit: TreeValue,
        mode: ProcessingMode,
        data_key: Option<&str>,
        outcome: &mut Classification,
    ) {
        if mode == ProcessingMode::Object && unit.as_mapping().is_none() {
            let message = format!("object mode expects a mapping, found a {}", unit.type_name());
            self.fail_with(DiagnosticKind::TypeMismatch, unit, message, outcome);
            return;
        }
        match data_key {
            None => {
                self.pass.push(unit);
                outcome.passed += 1;
            }
            Some(key) if unit.get_path(key).is_none() => {
                let message = format!("unit has no key '{key}'");
                self.fail_with(DiagnosticKind::MissingKey, unit, message, outcome);
            }
            Some(key) => {
                if let Some(value) = unit.into_path(key) {
                    self.pass.push(value);
                    outcome.passed += 1;
                }
            }
        }
    }

    fn fail_with(
        &mut self,
        kind: DiagnosticKind,
        unit: TreeValue,
        message: String,
        outcome: &mut Classification,
    ) {
        self.fail.push(FailedItem::new(kind, FailedPayload::Tree(unit)));
        outcome.rejections.push(Rejection { kind, message });
    }

    /// Record an item that failed before classification (decode, encode).
    pub fn reject(&mut self, kind: DiagnosticKind, payload: FailedPayload) {
        self.fail.push(FailedItem::new(kind, payload));
    }

    /// Project pass records appended since `start` onto `usecols`.
    ///
    /// Records that are not mappings are left untouched.
    pub fn project_since(&mut self, start: usize, usecols: &UseCols) {
        for record in self.pass.iter_mut().skip(start) {
            if let TreeValue::Mapping(map) = record {
                map.retain_entries(|index, key| usecols.keeps(index, key));
            }
        }
    }

    pub(crate) fn take_pending(&mut self) -> Vec<TreeValue> {
        std::mem::take(&mut self.pass)
    }

    pub(crate) fn clear_failed(&mut self) {
        self.fail.clear();
    }
}
