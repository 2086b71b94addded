// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    FormDraft, FormKind, ItemId, KitId, PageKind, PageTarget, PendingSigningId, Row, RowId,
    SelectedRow, SigningId, SwitchRequestId, TrackingId, UserId, is_kit_row,
};

pub const INVALID_SELECTION_MESSAGE: &str = "detected invalid selected items";
pub const EMPTY_SELECTION_MESSAGE: &str = "no rows selected -- check at least one row and retry";

/// Every backend endpoint the client posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Login,
    CreateMasterAccount,
    CreateClientAccount,
    VerifyNewSigningAccess,
    VerifySwitchAccess,
    AddItem,
    UpdateItem,
    DeleteItem,
    NewKit,
    KitContent,
    KitRemoveItems,
    AddItemsToPendingSignings,
    DeletePendingSigning,
    AddItemsToSignings,
    SwitchSigning,
    CancelSwitchRequest,
    ApproveSwitchRequests,
    RejectSwitchRequests,
    DeleteClientUser,
    AddTracking,
    UpdateTrackingResults,
    UpdateTrackingInterval,
    DeleteTracking,
}

impl ActionKind {
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Login => "/token",
            Self::CreateMasterAccount => "/create_master_account",
            Self::CreateClientAccount => "/create_client_account",
            Self::VerifyNewSigningAccess => "/master/verify-new-signing-access",
            Self::VerifySwitchAccess => "/client/verify-switch-signing-access",
            Self::AddItem => "/master/add_item_to_inventory",
            Self::UpdateItem => "/master/update_inventory",
            Self::DeleteItem => "/master/delete_item_from_inventory",
            Self::NewKit => "/master/new_kit",
            Self::KitContent => "/master/kit_content",
            Self::KitRemoveItems => "/master/kit_remove_items",
            Self::AddItemsToPendingSignings => "/master/add_items_to_pending_signings",
            Self::DeletePendingSigning => "/master/delete_item_from_pending_signings",
            Self::AddItemsToSignings => "/master/add_items_to_signings",
            Self::SwitchSigning => "/client/switch_signing",
            Self::CancelSwitchRequest => "/client/cancel_switch_request",
            // The server spells these routes this way.
            Self::ApproveSwitchRequests => "/master/approve_switch_rquest",
            Self::RejectSwitchRequests => "/master/reject_switch_rquest",
            Self::DeleteClientUser => "/master/delete_client_user",
            Self::AddTracking => "/master/add_amplifier_tracking",
            Self::UpdateTrackingResults => "/master/update_amplifier_results",
            Self::UpdateTrackingInterval => "/master/update_amplifier_interval",
            Self::DeleteTracking => "/master/delete_amplifier_tracking",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Login => "log in",
            Self::CreateMasterAccount => "create master account",
            Self::CreateClientAccount => "create client account",
            Self::VerifyNewSigningAccess => "verify signer",
            Self::VerifySwitchAccess => "verify new signer",
            Self::AddItem => "add item",
            Self::UpdateItem => "update item",
            Self::DeleteItem => "delete item",
            Self::NewKit => "create kit",
            Self::KitContent => "open kit",
            Self::KitRemoveItems => "remove kit items",
            Self::AddItemsToPendingSignings => "sign items",
            Self::DeletePendingSigning => "delete pending signing",
            Self::AddItemsToSignings => "confirm signings",
            Self::SwitchSigning => "request switch",
            Self::CancelSwitchRequest => "cancel switch request",
            Self::ApproveSwitchRequests => "approve switch requests",
            Self::RejectSwitchRequests => "reject switch requests",
            Self::DeleteClientUser => "delete client user",
            Self::AddTracking => "track amplifier",
            Self::UpdateTrackingResults => "update results",
            Self::UpdateTrackingInterval => "update interval",
            Self::DeleteTracking => "delete tracking",
        }
    }

    /// Destructive actions that need an explicit yes before sending.
    pub const fn requires_confirmation(self) -> bool {
        matches!(
            self,
            Self::DeleteItem
                | Self::DeletePendingSigning
                | Self::DeleteClientUser
                | Self::DeleteTracking
        )
    }

    /// Banner text for a 2xx answer that carries neither a redirect nor a
    /// message.
    pub const fn success_message(self) -> Option<&'static str> {
        match self {
            Self::CreateClientAccount => Some("created client user successfully"),
            Self::CreateMasterAccount => Some("created master user successfully"),
            _ => None,
        }
    }
}

/// A fully built request, waiting to be sent (or confirmed first).
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub action: ActionKind,
    pub body: Value,
    pub summary: String,
}

impl PendingRequest {
    pub fn new(action: ActionKind, body: Value, summary: impl Into<String>) -> Self {
        Self {
            action,
            body,
            summary: summary.into(),
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        self.action.requires_confirmation()
    }

    pub fn confirm_prompt(&self) -> String {
        format!("{} {}? (y/n)", self.action.label(), self.summary)
    }
}

/// Submits that gather the checked rows of a selection page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    AddToPendingSignings,
    AddToSignings,
    SwitchSigning,
    ApproveSwitchRequests,
    RejectSwitchRequests,
}

#[derive(Serialize)]
struct SigningItem {
    item_id: ItemId,
    quantity: Option<String>,
}

#[derive(Serialize)]
struct SwitchItem {
    signing_id: SigningId,
    quantity: Option<String>,
}

#[derive(Serialize)]
struct PendingSigningRef {
    pending_signing_id: PendingSigningId,
}

#[derive(Serialize)]
struct SwitchRequestRef {
    switch_request_id: SwitchRequestId,
}

/// `signing_descrition` is the key the server reads.
#[derive(Serialize)]
struct DescribedBatch<T> {
    selected_items: Vec<T>,
    signing_descrition: String,
}

#[derive(Serialize)]
struct ItemBatch<T> {
    selected_items: Vec<T>,
}

#[derive(Serialize)]
struct RequestBatch<T> {
    selected_requests: Vec<T>,
}

impl BatchAction {
    pub const fn action(self) -> ActionKind {
        match self {
            Self::AddToPendingSignings => ActionKind::AddItemsToPendingSignings,
            Self::AddToSignings => ActionKind::AddItemsToSignings,
            Self::SwitchSigning => ActionKind::SwitchSigning,
            Self::ApproveSwitchRequests => ActionKind::ApproveSwitchRequests,
            Self::RejectSwitchRequests => ActionKind::RejectSwitchRequests,
        }
    }

    pub const fn key(self) -> char {
        match self {
            Self::RejectSwitchRequests => 'X',
            _ => 'x',
        }
    }

    pub const fn label(self) -> &'static str {
        self.action().label()
    }

    pub const fn needs_description(self) -> bool {
        matches!(self, Self::AddToPendingSignings | Self::SwitchSigning)
    }

    /// Builds the request body. Selected quantities go out as strings, the
    /// type the server's batch models declare.
    pub fn payload(self, selected: &[SelectedRow], description: Option<&str>) -> Result<Value> {
        if selected.is_empty() {
            bail!(EMPTY_SELECTION_MESSAGE);
        }
        let description = description.map(str::trim).unwrap_or_default();
        if self.needs_description() && description.is_empty() {
            bail!("signing description is required -- enter a description and retry");
        }

        let quantity = |row: &SelectedRow| row.quantity.map(|quantity| quantity.to_string());
        let body = match self {
            Self::AddToPendingSignings => serde_json::to_value(DescribedBatch {
                selected_items: selected
                    .iter()
                    .map(|row| SigningItem {
                        item_id: ItemId::from(row.id.as_str()),
                        quantity: quantity(row),
                    })
                    .collect(),
                signing_descrition: description.to_owned(),
            }),
            Self::SwitchSigning => serde_json::to_value(DescribedBatch {
                selected_items: selected
                    .iter()
                    .map(|row| SwitchItem {
                        signing_id: SigningId::from(row.id.as_str()),
                        quantity: quantity(row),
                    })
                    .collect(),
                signing_descrition: description.to_owned(),
            }),
            Self::AddToSignings => serde_json::to_value(ItemBatch {
                selected_items: selected
                    .iter()
                    .map(|row| PendingSigningRef {
                        pending_signing_id: PendingSigningId::from(row.id.as_str()),
                    })
                    .collect(),
            }),
            Self::ApproveSwitchRequests | Self::RejectSwitchRequests => {
                serde_json::to_value(RequestBatch {
                    selected_requests: selected
                        .iter()
                        .map(|row| SwitchRequestRef {
                            switch_request_id: SwitchRequestId::from(row.id.as_str()),
                        })
                        .collect(),
                })
            }
        };
        body.with_context(|| format!("encode {} payload", self.label()))
    }

    pub fn request(
        self,
        selected: &[SelectedRow],
        description: Option<&str>,
    ) -> Result<PendingRequest> {
        let body = self.payload(selected, description)?;
        let summary = match selected.len() {
            1 => "1 row".to_owned(),
            count => format!("{count} rows"),
        };
        Ok(PendingRequest::new(self.action(), body, summary))
    }
}

/// Page-level actions that open a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    AddItem,
    NewKit,
    VerifyNewSigningAccess,
    VerifySwitchAccess,
    CreateClientAccount,
    CreateMasterAccount,
}

impl PageAction {
    pub const fn key(self) -> char {
        match self {
            Self::AddItem | Self::NewKit | Self::CreateClientAccount => 'a',
            Self::CreateMasterAccount => 'A',
            Self::VerifyNewSigningAccess | Self::VerifySwitchAccess => 'v',
        }
    }

    pub const fn form(self) -> FormKind {
        match self {
            Self::AddItem => FormKind::AddItem,
            Self::NewKit => FormKind::NewKit,
            Self::VerifyNewSigningAccess => FormKind::VerifyNewSigningAccess,
            Self::VerifySwitchAccess => FormKind::VerifySwitchAccess,
            Self::CreateClientAccount => FormKind::CreateClientAccount,
            Self::CreateMasterAccount => FormKind::CreateMasterAccount,
        }
    }

    pub const fn label(self) -> &'static str {
        self.form().title()
    }
}

/// Per-row buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    ShowKitContent,
    EditItem,
    DeleteItem,
    OpenKitContent,
    KitRemoveItems,
    DeletePendingSigning,
    CancelSwitchRequest,
    DeleteClientUser,
    TrackItem,
    UpdateResults,
    ChangeInterval,
    DeleteTracking,
}

/// What a row action turns into once applied to a row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowEffect {
    OpenForm {
        draft: FormDraft,
        warning: Option<String>,
    },
    Send(PendingRequest),
    Drill(PageTarget),
}

impl RowAction {
    pub const fn key(self) -> char {
        match self {
            Self::ShowKitContent => 'o',
            Self::EditItem => 'e',
            Self::DeleteItem
            | Self::DeletePendingSigning
            | Self::DeleteClientUser
            | Self::DeleteTracking => 'd',
            Self::OpenKitContent | Self::CancelSwitchRequest => 'c',
            Self::KitRemoveItems => 'm',
            Self::TrackItem => 't',
            Self::UpdateResults => 'u',
            Self::ChangeInterval => 'i',
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ShowKitContent => "kit content",
            Self::EditItem => "edit",
            Self::DeleteItem
            | Self::DeletePendingSigning
            | Self::DeleteClientUser
            | Self::DeleteTracking => "delete",
            Self::OpenKitContent => "content",
            Self::KitRemoveItems => "remove items",
            Self::CancelSwitchRequest => "cancel",
            Self::TrackItem => "track",
            Self::UpdateResults => "results",
            Self::ChangeInterval => "interval",
        }
    }

    pub fn applies_to(self, row: &Row) -> bool {
        match self {
            Self::ShowKitContent => is_kit_row(row),
            _ => true,
        }
    }

    pub fn resolve(self, row: &Row) -> Result<RowEffect> {
        match self {
            Self::ShowKitContent => {
                if !is_kit_row(row) {
                    bail!("{} is not a kit", row_summary(row));
                }
                let id = identity(row, "object_id")?;
                Ok(RowEffect::Drill(PageTarget::with_param(
                    PageKind::KitContentByItem,
                    id.as_str(),
                )))
            }
            Self::EditItem => {
                identity(row, "object_id")?;
                let (draft, warning) = FormDraft::edit_item(row);
                Ok(RowEffect::OpenForm { draft, warning })
            }
            Self::TrackItem => {
                let item = identity(row, "object_id")?.clone();
                Ok(RowEffect::OpenForm {
                    draft: FormDraft::for_target(FormKind::AddTracking, item),
                    warning: None,
                })
            }
            Self::UpdateResults => Ok(RowEffect::OpenForm {
                draft: FormDraft::for_target(
                    FormKind::TrackingResults,
                    identity(row, "object_id")?.clone(),
                ),
                warning: None,
            }),
            Self::ChangeInterval => {
                identity(row, "object_id")?;
                Ok(RowEffect::OpenForm {
                    draft: FormDraft::tracking_interval(row),
                    warning: None,
                })
            }
            Self::DeleteItem => {
                let item_id = ItemId::from(identity(row, "object_id")?.as_str());
                Ok(self.send(ActionKind::DeleteItem, json!({ "item_id": item_id }), row))
            }
            Self::OpenKitContent | Self::KitRemoveItems => {
                let kit_id = KitId::from(identity(row, "kit_id")?.as_str());
                let action = if self == Self::OpenKitContent {
                    ActionKind::KitContent
                } else {
                    ActionKind::KitRemoveItems
                };
                Ok(self.send(action, json!({ "kit_id": kit_id }), row))
            }
            Self::DeletePendingSigning => {
                let pending = PendingSigningId::from(identity(row, "object_id")?.as_str());
                Ok(self.send(
                    ActionKind::DeletePendingSigning,
                    json!({ "pending_signing_id": pending }),
                    row,
                ))
            }
            Self::CancelSwitchRequest => {
                let request = SwitchRequestId::from(identity(row, "request_id")?.as_str());
                Ok(self.send(
                    ActionKind::CancelSwitchRequest,
                    json!({ "canceled_request_id": request }),
                    row,
                ))
            }
            Self::DeleteClientUser => {
                let user = UserId::from(identity(row, "user_id")?.as_str());
                Ok(self.send(ActionKind::DeleteClientUser, json!({ "user_id": user }), row))
            }
            Self::DeleteTracking => {
                let tracking = TrackingId::from(identity(row, "object_id")?.as_str());
                Ok(self.send(
                    ActionKind::DeleteTracking,
                    json!({ "object_id": tracking }),
                    row,
                ))
            }
        }
    }

    fn send(self, action: ActionKind, body: Value, row: &Row) -> RowEffect {
        RowEffect::Send(PendingRequest::new(action, body, row_summary(row)))
    }
}

/// Row actions need the server's id; positional ids are local only.
fn identity<'a>(row: &'a Row, field: &str) -> Result<&'a RowId> {
    if row.id.is_positional() {
        bail!("row has no {field} -- reload the page and retry");
    }
    Ok(&row.id)
}

/// Short human name for a row, used in prompts.
pub fn row_summary(row: &Row) -> String {
    for key in ["name", "kit_name", "action"] {
        let value = row.display(key);
        if !value.trim().is_empty() {
            return value;
        }
    }
    let full_name = format!("{} {}", row.display("first_name"), row.display("last_name"));
    if !full_name.trim().is_empty() {
        return full_name.trim().to_owned();
    }
    row.id.to_string()
}
