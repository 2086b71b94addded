// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{QuantitySpec, Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowValidity {
    Unchecked,
    ValidChecked,
    InvalidChecked,
}

impl RowValidity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unchecked => "",
            Self::ValidChecked => "ok",
            Self::InvalidChecked => "invalid quantity",
        }
    }
}

/// What happens to an invalid checked row when the selection is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    AbortOnInvalid,
    ExcludeInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowSelectionState {
    pub checked: bool,
    pub entered_quantity: String,
    pub max_quantity: Option<i64>,
    /// Set on pages that send a quantity with each checked row.
    pub requires_quantity: bool,
}

impl RowSelectionState {
    pub fn entered_quantity(&self) -> Option<i64> {
        self.entered_quantity.trim().parse().ok()
    }

    /// A checked row that needs a quantity is valid only when the entered
    /// quantity parses and, if the row has a max, does not exceed it.
    pub fn validity(&self) -> RowValidity {
        if !self.checked {
            return RowValidity::Unchecked;
        }
        let quantity_ok = !self.requires_quantity
            || self.entered_quantity().is_some_and(|quantity| {
                self.max_quantity.is_none_or(|max| quantity <= max)
            });
        if quantity_ok {
            RowValidity::ValidChecked
        } else {
            RowValidity::InvalidChecked
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRow {
    pub id: RowId,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(Vec<SelectedRow>),
    /// Collection aborted at this row; nothing may be sent.
    Invalid(RowId),
}

/// Checkbox and quantity state for one loaded table, kept in load order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionModel {
    entries: Vec<(RowId, RowSelectionState)>,
    tracks_quantity: bool,
}

impl SelectionModel {
    pub fn for_rows(rows: &[Row], quantity: Option<QuantitySpec>) -> Self {
        let entries = rows
            .iter()
            .map(|row| {
                let state = match quantity {
                    Some(spec) => {
                        let max_quantity = row.integer(spec.max_key);
                        RowSelectionState {
                            checked: false,
                            entered_quantity: spec
                                .initial_quantity(max_quantity)
                                .map(|value| value.to_string())
                                .unwrap_or_default(),
                            max_quantity,
                            requires_quantity: true,
                        }
                    }
                    None => RowSelectionState::default(),
                };
                (row.id.clone(), state)
            })
            .collect();
        Self {
            entries,
            tracks_quantity: quantity.is_some(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tracks_quantity(&self) -> bool {
        self.tracks_quantity
    }

    pub fn state(&self, id: &RowId) -> Option<&RowSelectionState> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, state)| state)
    }

    fn state_mut(&mut self, id: &RowId) -> Option<&mut RowSelectionState> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, state)| state)
    }

    pub fn validity(&self, id: &RowId) -> RowValidity {
        self.state(id)
            .map_or(RowValidity::Unchecked, RowSelectionState::validity)
    }

    pub fn toggle(&mut self, id: &RowId) -> Option<RowValidity> {
        let state = self.state_mut(id)?;
        state.checked = !state.checked;
        Some(state.validity())
    }

    pub fn set_checked(&mut self, id: &RowId, checked: bool) -> Option<RowValidity> {
        let state = self.state_mut(id)?;
        state.checked = checked;
        Some(state.validity())
    }

    pub fn set_quantity(&mut self, id: &RowId, raw: &str) -> Option<RowValidity> {
        if !self.tracks_quantity {
            return None;
        }
        let state = self.state_mut(id)?;
        state.entered_quantity = raw.trim().to_owned();
        Some(state.validity())
    }

    /// Checks every visible row without touching quantities. If every
    /// visible row is already checked they are all cleared instead. Returns
    /// the new checked value.
    pub fn toggle_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a RowId>) -> bool {
        let visible: Vec<&RowId> = visible.into_iter().collect();
        let all_checked = !visible.is_empty()
            && visible
                .iter()
                .all(|id| self.state(id).is_some_and(|state| state.checked));
        let checked = !all_checked;
        for id in visible {
            self.set_checked(id, checked);
        }
        checked
    }

    pub fn check_all(&mut self) {
        for (_, state) in &mut self.entries {
            state.checked = true;
        }
    }

    pub fn checked_count(&self) -> usize {
        self.entries.iter().filter(|(_, state)| state.checked).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, state)| state.validity() == RowValidity::InvalidChecked)
            .count()
    }

    /// Scans rows in load order and gathers the valid checked ones.
    pub fn collect(&self, policy: SelectionPolicy) -> SelectionOutcome {
        let mut selected = Vec::new();
        for (id, state) in &self.entries {
            match state.validity() {
                RowValidity::Unchecked => {}
                RowValidity::ValidChecked => selected.push(SelectedRow {
                    id: id.clone(),
                    quantity: if self.tracks_quantity {
                        state.entered_quantity()
                    } else {
                        None
                    },
                }),
                RowValidity::InvalidChecked => match policy {
                    SelectionPolicy::AbortOnInvalid => {
                        return SelectionOutcome::Invalid(id.clone());
                    }
                    SelectionPolicy::ExcludeInvalid => {}
                },
            }
        }
        SelectionOutcome::Selected(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        RowSelectionState, RowValidity, SelectedRow, SelectionModel, SelectionOutcome,
        SelectionPolicy,
    };
    use crate::{QuantityDefault, QuantitySpec, RowId, rows_from_json};
    use anyhow::Result;
    use serde_json::json;

    const QUANTITY: QuantitySpec = QuantitySpec {
        max_key: "max_amount",
        default: QuantityDefault::One,
    };

    fn model_with(rows: serde_json::Value) -> Result<SelectionModel> {
        let rows = rows_from_json(&rows, "data", "object_id")?;
        Ok(SelectionModel::for_rows(&rows, Some(QUANTITY)))
    }

    fn state(checked: bool, quantity: &str, max: Option<i64>) -> RowSelectionState {
        RowSelectionState {
            checked,
            entered_quantity: quantity.to_owned(),
            max_quantity: max,
            requires_quantity: true,
        }
    }

    #[test]
    fn validity_follows_checked_and_max() {
        assert_eq!(state(false, "9", Some(2)).validity(), RowValidity::Unchecked);
        assert_eq!(state(true, "2", Some(2)).validity(), RowValidity::ValidChecked);
        assert_eq!(state(true, "3", Some(2)).validity(), RowValidity::InvalidChecked);
        assert_eq!(state(true, "300", None).validity(), RowValidity::ValidChecked);
    }

    #[test]
    fn unparseable_quantity_with_max_is_invalid() {
        assert_eq!(state(true, "", Some(2)).validity(), RowValidity::InvalidChecked);
        assert_eq!(state(true, "two", Some(2)).validity(), RowValidity::InvalidChecked);
    }

    #[test]
    fn quantity_must_parse_even_without_max() {
        assert_eq!(state(true, "", None).validity(), RowValidity::InvalidChecked);
        assert_eq!(state(true, "abc", None).validity(), RowValidity::InvalidChecked);
        assert_eq!(state(false, "", None).validity(), RowValidity::Unchecked);
    }

    #[test]
    fn row_without_max_is_held_back_until_quantity_entered() -> Result<()> {
        let mut model = model_with(json!([{"object_id": "a", "max_amount": null}]))?;
        let a = RowId::from("a");
        model.set_checked(&a, true);

        model.set_quantity(&a, "");
        assert_eq!(model.validity(&a), RowValidity::InvalidChecked);
        assert_eq!(
            model.collect(SelectionPolicy::AbortOnInvalid),
            SelectionOutcome::Invalid(a.clone())
        );

        model.set_quantity(&a, "abc");
        assert_eq!(model.validity(&a), RowValidity::InvalidChecked);
        assert_eq!(
            model.collect(SelectionPolicy::ExcludeInvalid),
            SelectionOutcome::Selected(Vec::new())
        );

        assert_eq!(model.set_quantity(&a, "12"), Some(RowValidity::ValidChecked));
        assert_eq!(
            model.collect(SelectionPolicy::AbortOnInvalid),
            SelectionOutcome::Selected(vec![SelectedRow {
                id: a,
                quantity: Some(12)
            }])
        );
        Ok(())
    }

    #[test]
    fn max_default_without_max_starts_invalid_when_checked() -> Result<()> {
        let rows = rows_from_json(
            &json!([{"signing_id": "s1", "quantity": null}]),
            "data",
            "signing_id",
        )?;
        let mut model = SelectionModel::for_rows(
            &rows,
            Some(QuantitySpec {
                max_key: "quantity",
                default: QuantityDefault::Max,
            }),
        );
        let id = RowId::from("s1");
        assert_eq!(model.toggle(&id), Some(RowValidity::InvalidChecked));
        Ok(())
    }

    #[test]
    fn abort_policy_rejects_whole_selection() -> Result<()> {
        let mut model = model_with(json!([
            {"object_id": "a", "max_amount": 5},
            {"object_id": "b", "max_amount": 2},
        ]))?;
        let (a, b) = (RowId::from("a"), RowId::from("b"));
        model.set_checked(&a, true);
        model.set_quantity(&a, "3");
        model.set_checked(&b, true);
        model.set_quantity(&b, "9");

        assert_eq!(
            model.collect(SelectionPolicy::AbortOnInvalid),
            SelectionOutcome::Invalid(b)
        );
        Ok(())
    }

    #[test]
    fn abort_policy_collects_valid_rows_in_load_order() -> Result<()> {
        let mut model = model_with(json!([
            {"object_id": "a", "max_amount": 5},
            {"object_id": "b", "max_amount": 2},
        ]))?;
        let (a, b) = (RowId::from("a"), RowId::from("b"));
        model.set_checked(&b, true);
        model.set_quantity(&b, "2");
        model.set_checked(&a, true);
        model.set_quantity(&a, "3");

        assert_eq!(
            model.collect(SelectionPolicy::AbortOnInvalid),
            SelectionOutcome::Selected(vec![
                SelectedRow {
                    id: a,
                    quantity: Some(3)
                },
                SelectedRow {
                    id: b,
                    quantity: Some(2)
                },
            ])
        );
        Ok(())
    }

    #[test]
    fn exclude_policy_skips_invalid_rows() -> Result<()> {
        let mut model = model_with(json!([
            {"object_id": "a", "max_amount": 5},
            {"object_id": "b", "max_amount": 2},
        ]))?;
        let (a, b) = (RowId::from("a"), RowId::from("b"));
        model.set_checked(&a, true);
        model.set_checked(&b, true);
        model.set_quantity(&b, "9");

        assert_eq!(
            model.collect(SelectionPolicy::ExcludeInvalid),
            SelectionOutcome::Selected(vec![SelectedRow {
                id: a,
                quantity: Some(1)
            }])
        );
        Ok(())
    }

    #[test]
    fn default_quantity_follows_spec() -> Result<()> {
        let rows = rows_from_json(
            &json!([{"signing_id": "s1", "quantity": 4}]),
            "data",
            "signing_id",
        )?;
        let model = SelectionModel::for_rows(
            &rows,
            Some(QuantitySpec {
                max_key: "quantity",
                default: QuantityDefault::Max,
            }),
        );
        let state = model
            .state(&RowId::from("s1"))
            .expect("row should be tracked");
        assert_eq!(state.entered_quantity(), Some(4));
        assert_eq!(state.max_quantity, Some(4));
        assert!(!state.checked);
        Ok(())
    }

    #[test]
    fn select_all_checks_visible_rows_and_keeps_quantities() -> Result<()> {
        let mut model = model_with(json!([
            {"object_id": "a", "max_amount": 5},
            {"object_id": "b", "max_amount": 2},
            {"object_id": "c", "max_amount": 2},
        ]))?;
        let (a, b, c) = (RowId::from("a"), RowId::from("b"), RowId::from("c"));
        model.set_quantity(&b, "7");

        let checked = model.toggle_all([&a, &b]);
        assert!(checked);
        assert_eq!(model.validity(&a), RowValidity::ValidChecked);
        assert_eq!(model.validity(&b), RowValidity::InvalidChecked);
        assert_eq!(model.validity(&c), RowValidity::Unchecked);
        assert_eq!(model.invalid_count(), 1);

        let checked = model.toggle_all([&a, &b]);
        assert!(!checked);
        assert_eq!(model.checked_count(), 0);
        Ok(())
    }

    #[test]
    fn checkbox_only_model_ignores_quantity_edits() -> Result<()> {
        let rows = rows_from_json(&json!([{"request_id": 1}]), "data", "request_id")?;
        let mut model = SelectionModel::for_rows(&rows, None);
        let id = RowId::from("1");
        assert_eq!(model.set_quantity(&id, "4"), None);
        assert_eq!(model.toggle(&id), Some(RowValidity::ValidChecked));
        assert_eq!(
            model.collect(SelectionPolicy::ExcludeInvalid),
            SelectionOutcome::Selected(vec![SelectedRow { id, quantity: None }])
        );
        Ok(())
    }

    #[test]
    fn unknown_row_is_ignored() {
        let mut model = SelectionModel::default();
        assert_eq!(model.toggle(&RowId::from("ghost")), None);
        assert_eq!(model.validity(&RowId::from("ghost")), RowValidity::Unchecked);
    }
}
