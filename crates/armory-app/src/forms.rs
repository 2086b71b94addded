// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
    ActionKind, BatchAction, ItemId, PendingRequest, Row, RowId, TrackingId, parse_count_total,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    CreateMasterAccount,
    CreateClientAccount,
    VerifyNewSigningAccess,
    VerifySwitchAccess,
    AddItem,
    EditItem,
    NewKit,
    AddTracking,
    TrackingResults,
    TrackingInterval,
    SigningDescription(BatchAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Text,
    }
}

const fn secret(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Secret,
    }
}

const fn integer(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Integer,
    }
}

const ITEM_FIELDS: &[FieldSpec] = &[
    text("name", "name"),
    text("category", "category"),
    integer("total_count", "total count"),
    text("color", "color"),
    text("palga", "palga"),
    text("mami_serial", "mami serial"),
    text("manufacture_mkt", "manufacture mkt"),
    text("katzi_mkt", "katzi mkt"),
    text("serial_no", "serial no"),
    text("description", "description"),
];

impl FormKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "log in",
            Self::CreateMasterAccount => "new master account",
            Self::CreateClientAccount => "new client account",
            Self::VerifyNewSigningAccess => "verify signer",
            Self::VerifySwitchAccess => "verify new signer",
            Self::AddItem => "add item",
            Self::EditItem => "edit item",
            Self::NewKit => "new kit",
            Self::AddTracking => "track amplifier",
            Self::TrackingResults => "test results",
            Self::TrackingInterval => "test interval",
            Self::SigningDescription(_) => "signing description",
        }
    }

    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Login => LOGIN_FIELDS,
            Self::CreateMasterAccount => MASTER_ACCOUNT_FIELDS,
            Self::CreateClientAccount => CLIENT_ACCOUNT_FIELDS,
            Self::VerifyNewSigningAccess => NEW_SIGNING_ACCESS_FIELDS,
            Self::VerifySwitchAccess => SWITCH_ACCESS_FIELDS,
            Self::AddItem | Self::EditItem => ITEM_FIELDS,
            Self::NewKit => KIT_FIELDS,
            Self::AddTracking => TRACKING_FIELDS,
            Self::TrackingResults => RESULTS_FIELDS,
            Self::TrackingInterval => INTERVAL_FIELDS,
            Self::SigningDescription(_) => DESCRIPTION_FIELDS,
        }
    }
}

const LOGIN_FIELDS: &[FieldSpec] = &[integer("personal_id", "personal id"), secret("password", "password")];

const MASTER_ACCOUNT_FIELDS: &[FieldSpec] = &[
    text("first_name", "first name"),
    text("last_name", "last name"),
    integer("personal_id", "personal id"),
    text("email", "email"),
    secret("password", "password"),
    secret("confirm_password", "confirm password"),
    secret("master_password", "master password"),
];

const CLIENT_ACCOUNT_FIELDS: &[FieldSpec] = &[
    text("palga", "palga"),
    text("team", "team"),
    text("first_name", "first name"),
    text("last_name", "last name"),
    integer("personal_id", "personal id"),
    text("email", "email"),
    secret("password", "password"),
    secret("confirm_password", "confirm password"),
    secret("master_password", "master password"),
];

const NEW_SIGNING_ACCESS_FIELDS: &[FieldSpec] = &[
    integer("signer_personal_id", "signer personal id"),
    secret("master_password", "master password"),
];

const SWITCH_ACCESS_FIELDS: &[FieldSpec] = &[
    text("new_personal_id", "new signer personal id"),
    secret("client_password", "your password"),
];

const KIT_FIELDS: &[FieldSpec] = &[text("kit_name", "kit name"), text("palga", "palga")];

const TRACKING_FIELDS: &[FieldSpec] = &[
    integer("days_interval", "days between tests"),
    text("test_type", "test type"),
];

const RESULTS_FIELDS: &[FieldSpec] = &[text("results", "results")];

const INTERVAL_FIELDS: &[FieldSpec] = &[integer("interval", "interval (days)")];

const DESCRIPTION_FIELDS: &[FieldSpec] = &[text("description", "description")];

fn as_decimal_string<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginInput {
    #[serde(serialize_with = "as_decimal_string")]
    pub personal_id: i64,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterAccountInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "as_decimal_string")]
    pub personal_id: i64,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub master_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientAccountInput {
    pub palga: String,
    pub team: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "as_decimal_string")]
    pub personal_id: i64,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub master_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSigningAccessInput {
    #[serde(serialize_with = "as_decimal_string")]
    pub signer_personal_id: i64,
    pub master_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchAccessInput {
    pub new_personal_id: String,
    pub client_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFormInput {
    pub name: String,
    pub category: String,
    #[serde(serialize_with = "as_decimal_string")]
    pub total_count: i64,
    pub color: String,
    pub palga: String,
    pub mami_serial: String,
    pub manufacture_mkt: String,
    pub katzi_mkt: String,
    pub serial_no: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemUpdateInput {
    pub item_id: ItemId,
    #[serde(flatten)]
    pub item: ItemFormInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KitFormInput {
    pub kit_name: String,
    pub palga: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingFormInput {
    pub item_id: ItemId,
    #[serde(serialize_with = "as_decimal_string")]
    pub days_interval: i64,
    pub test_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingResultsInput {
    pub object_id: TrackingId,
    pub results: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingIntervalInput {
    pub object_id: TrackingId,
    #[serde(serialize_with = "as_decimal_string")]
    pub interval: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Login(LoginInput),
    MasterAccount(MasterAccountInput),
    ClientAccount(ClientAccountInput),
    NewSigningAccess(NewSigningAccessInput),
    SwitchAccess(SwitchAccessInput),
    AddItem(ItemFormInput),
    UpdateItem(ItemUpdateInput),
    NewKit(KitFormInput),
    AddTracking(TrackingFormInput),
    TrackingResults(TrackingResultsInput),
    TrackingInterval(TrackingIntervalInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Login(_) => FormKind::Login,
            Self::MasterAccount(_) => FormKind::CreateMasterAccount,
            Self::ClientAccount(_) => FormKind::CreateClientAccount,
            Self::NewSigningAccess(_) => FormKind::VerifyNewSigningAccess,
            Self::SwitchAccess(_) => FormKind::VerifySwitchAccess,
            Self::AddItem(_) => FormKind::AddItem,
            Self::UpdateItem(_) => FormKind::EditItem,
            Self::NewKit(_) => FormKind::NewKit,
            Self::AddTracking(_) => FormKind::AddTracking,
            Self::TrackingResults(_) => FormKind::TrackingResults,
            Self::TrackingInterval(_) => FormKind::TrackingInterval,
        }
    }

    pub fn action(&self) -> ActionKind {
        match self {
            Self::Login(_) => ActionKind::Login,
            Self::MasterAccount(_) => ActionKind::CreateMasterAccount,
            Self::ClientAccount(_) => ActionKind::CreateClientAccount,
            Self::NewSigningAccess(_) => ActionKind::VerifyNewSigningAccess,
            Self::SwitchAccess(_) => ActionKind::VerifySwitchAccess,
            Self::AddItem(_) => ActionKind::AddItem,
            Self::UpdateItem(_) => ActionKind::UpdateItem,
            Self::NewKit(_) => ActionKind::NewKit,
            Self::AddTracking(_) => ActionKind::AddTracking,
            Self::TrackingResults(_) => ActionKind::UpdateTrackingResults,
            Self::TrackingInterval(_) => ActionKind::UpdateTrackingInterval,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Login(login) => {
                if login.password.is_empty() {
                    bail!("password is required -- enter a password and retry");
                }
                Ok(())
            }
            Self::MasterAccount(account) => {
                require("first name", &account.first_name)?;
                require("last name", &account.last_name)?;
                require("email", &account.email)?;
                require("password", &account.password)?;
                require("master password", &account.master_password)?;
                passwords_match(&account.password, &account.confirm_password)
            }
            Self::ClientAccount(account) => {
                require("palga", &account.palga)?;
                require("team", &account.team)?;
                require("first name", &account.first_name)?;
                require("last name", &account.last_name)?;
                require("email", &account.email)?;
                require("password", &account.password)?;
                require("master password", &account.master_password)?;
                passwords_match(&account.password, &account.confirm_password)
            }
            Self::NewSigningAccess(access) => require("master password", &access.master_password),
            Self::SwitchAccess(access) => {
                require("new signer personal id", &access.new_personal_id)?;
                require("your password", &access.client_password)
            }
            Self::AddItem(item) => item.validate(),
            Self::UpdateItem(update) => update.item.validate(),
            Self::NewKit(kit) => require("kit name", &kit.kit_name),
            Self::AddTracking(tracking) => {
                if tracking.days_interval < 1 {
                    bail!("days between tests must be at least 1");
                }
                require("test type", &tracking.test_type)
            }
            Self::TrackingResults(results) => require("results", &results.results),
            Self::TrackingInterval(interval) => {
                if interval.interval < 1 {
                    bail!("interval must be at least 1 day");
                }
                Ok(())
            }
        }
    }

    pub fn to_body(&self) -> Result<Value> {
        let body = match self {
            Self::Login(input) => serde_json::to_value(input),
            Self::MasterAccount(input) => serde_json::to_value(input),
            Self::ClientAccount(input) => serde_json::to_value(input),
            Self::NewSigningAccess(input) => serde_json::to_value(input),
            Self::SwitchAccess(input) => serde_json::to_value(input),
            Self::AddItem(input) => serde_json::to_value(input),
            Self::UpdateItem(input) => serde_json::to_value(input),
            Self::NewKit(input) => serde_json::to_value(input),
            Self::AddTracking(input) => serde_json::to_value(input),
            Self::TrackingResults(input) => serde_json::to_value(input),
            Self::TrackingInterval(input) => serde_json::to_value(input),
        };
        body.with_context(|| format!("encode {} form", self.kind().title()))
    }

    pub fn into_request(self) -> Result<PendingRequest> {
        self.validate()?;
        let body = self.to_body()?;
        let summary = self.summary();
        Ok(PendingRequest::new(self.action(), body, summary))
    }

    fn summary(&self) -> String {
        match self {
            Self::AddItem(item) => item.name.clone(),
            Self::UpdateItem(update) => update.item.name.clone(),
            Self::NewKit(kit) => kit.kit_name.clone(),
            Self::MasterAccount(account) => format!("{} {}", account.first_name, account.last_name),
            Self::ClientAccount(account) => format!("{} {}", account.first_name, account.last_name),
            _ => self.kind().title().to_owned(),
        }
    }
}

impl ItemFormInput {
    pub fn validate(&self) -> Result<()> {
        require("item name", &self.name)?;
        require("category", &self.category)?;
        if self.total_count < 0 {
            bail!("total count cannot be negative");
        }
        Ok(())
    }
}

fn require(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{label} is required -- enter a {label} and retry");
    }
    Ok(())
}

fn passwords_match(password: &str, confirm: &str) -> Result<()> {
    if password != confirm {
        bail!("passwords do not match -- retype the confirmation and retry");
    }
    Ok(())
}

/// What submitting a form produces.
#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    Request(PendingRequest),
    /// A batch waiting on the selection it describes.
    Batch {
        batch: BatchAction,
        description: String,
    },
}

/// Raw text of an open form, one value per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub kind: FormKind,
    pub values: Vec<String>,
    /// Row the form acts on, for edit and tracking forms.
    pub target: Option<RowId>,
}

impl FormDraft {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            values: vec![String::new(); kind.fields().len()],
            target: None,
        }
    }

    pub fn for_target(kind: FormKind, target: RowId) -> Self {
        Self {
            target: Some(target),
            ..Self::new(kind)
        }
    }

    /// Prefills an edit form from an inventory row. The total count comes
    /// from the `current / total` display; when that does not parse the
    /// field stays empty and the reason is returned.
    pub fn edit_item(row: &Row) -> (Self, Option<String>) {
        let mut draft = Self::for_target(FormKind::EditItem, row.id.clone());
        let mut warning = None;
        for (index, field) in ITEM_FIELDS.iter().enumerate() {
            draft.values[index] = if field.key == "total_count" {
                match parse_count_total(&row.display("count")) {
                    Ok(total) => total.to_string(),
                    Err(error) => {
                        warning = Some(format!("{error:#} -- enter the total count"));
                        String::new()
                    }
                }
            } else {
                row.display(field.key)
            };
        }
        (draft, warning)
    }

    pub fn tracking_interval(row: &Row) -> Self {
        let mut draft = Self::for_target(FormKind::TrackingInterval, row.id.clone());
        draft.values[0] = row.display("interval");
        draft
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.kind.fields()
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields()
            .iter()
            .position(|field| field.key == key)
            .and_then(|index| self.values.get(index))
            .map_or("", String::as_str)
    }

    pub fn value_mut(&mut self, index: usize) -> Option<&mut String> {
        self.values.get_mut(index)
    }

    fn text(&self, key: &str) -> String {
        self.value(key).trim().to_owned()
    }

    /// Secrets are sent exactly as typed.
    fn secret(&self, key: &str) -> String {
        self.value(key).to_owned()
    }

    fn integer(&self, key: &str) -> Result<i64> {
        let label = self
            .fields()
            .iter()
            .find(|field| field.key == key)
            .map_or(key, |field| field.label);
        let raw = self.value(key).trim();
        if raw.is_empty() {
            bail!("{label} is required -- enter a number and retry");
        }
        raw.parse()
            .map_err(|_| anyhow!("{label} must be a whole number, got {raw:?}"))
    }

    fn target(&self) -> Result<&RowId> {
        self.target
            .as_ref()
            .with_context(|| format!("{} form has no target row -- reopen it from a row", self.kind.title()))
    }

    fn item(&self) -> Result<ItemFormInput> {
        Ok(ItemFormInput {
            name: self.text("name"),
            category: self.text("category"),
            total_count: self.integer("total_count")?,
            color: self.text("color"),
            palga: self.text("palga"),
            mami_serial: self.text("mami_serial"),
            manufacture_mkt: self.text("manufacture_mkt"),
            katzi_mkt: self.text("katzi_mkt"),
            serial_no: self.text("serial_no"),
            description: self.text("description"),
        })
    }

    /// Parses the raw values into a typed payload. Validation runs when the
    /// payload becomes a request.
    pub fn payload(&self) -> Result<Option<FormPayload>> {
        let payload = match self.kind {
            FormKind::Login => FormPayload::Login(LoginInput {
                personal_id: self.integer("personal_id")?,
                password: self.secret("password"),
            }),
            FormKind::CreateMasterAccount => FormPayload::MasterAccount(MasterAccountInput {
                first_name: self.text("first_name"),
                last_name: self.text("last_name"),
                personal_id: self.integer("personal_id")?,
                email: self.text("email"),
                password: self.secret("password"),
                confirm_password: self.secret("confirm_password"),
                master_password: self.secret("master_password"),
            }),
            FormKind::CreateClientAccount => FormPayload::ClientAccount(ClientAccountInput {
                palga: self.text("palga"),
                team: self.text("team"),
                first_name: self.text("first_name"),
                last_name: self.text("last_name"),
                personal_id: self.integer("personal_id")?,
                email: self.text("email"),
                password: self.secret("password"),
                confirm_password: self.secret("confirm_password"),
                master_password: self.secret("master_password"),
            }),
            FormKind::VerifyNewSigningAccess => FormPayload::NewSigningAccess(NewSigningAccessInput {
                signer_personal_id: self.integer("signer_personal_id")?,
                master_password: self.secret("master_password"),
            }),
            FormKind::VerifySwitchAccess => FormPayload::SwitchAccess(SwitchAccessInput {
                new_personal_id: self.text("new_personal_id"),
                client_password: self.secret("client_password"),
            }),
            FormKind::AddItem => FormPayload::AddItem(self.item()?),
            FormKind::EditItem => FormPayload::UpdateItem(ItemUpdateInput {
                item_id: ItemId::from(self.target()?.as_str()),
                item: self.item()?,
            }),
            FormKind::NewKit => FormPayload::NewKit(KitFormInput {
                kit_name: self.text("kit_name"),
                palga: self.text("palga"),
            }),
            FormKind::AddTracking => FormPayload::AddTracking(TrackingFormInput {
                item_id: ItemId::from(self.target()?.as_str()),
                days_interval: self.integer("days_interval")?,
                test_type: self.text("test_type"),
            }),
            FormKind::TrackingResults => FormPayload::TrackingResults(TrackingResultsInput {
                object_id: TrackingId::from(self.target()?.as_str()),
                results: self.text("results"),
            }),
            FormKind::TrackingInterval => FormPayload::TrackingInterval(TrackingIntervalInput {
                object_id: TrackingId::from(self.target()?.as_str()),
                interval: self.integer("interval")?,
            }),
            FormKind::SigningDescription(_) => return Ok(None),
        };
        Ok(Some(payload))
    }

    pub fn submit(&self) -> Result<FormSubmission> {
        if let FormKind::SigningDescription(batch) = self.kind {
            let description = self.text("description");
            if description.is_empty() {
                bail!("signing description is required -- enter a description and retry");
            }
            return Ok(FormSubmission::Batch { batch, description });
        }
        let payload = self
            .payload()?
            .ok_or_else(|| anyhow!("{} form has no payload", self.kind.title()))?;
        Ok(FormSubmission::Request(payload.into_request()?))
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, FormDraft, FormKind, FormPayload, FormSubmission};
    use crate::{ActionKind, BatchAction, RowId, rows_from_json};
    use anyhow::Result;
    use serde_json::json;

    fn fill(draft: &mut FormDraft, key: &str, value: &str) {
        let index = draft
            .fields()
            .iter()
            .position(|field| field.key == key)
            .expect("field should exist");
        draft.values[index] = value.to_owned();
    }

    fn request(draft: &FormDraft) -> Result<crate::PendingRequest> {
        match draft.submit()? {
            FormSubmission::Request(request) => Ok(request),
            FormSubmission::Batch { .. } => panic!("expected a request"),
        }
    }

    #[test]
    fn every_form_has_fields() {
        let kinds = [
            FormKind::Login,
            FormKind::CreateMasterAccount,
            FormKind::CreateClientAccount,
            FormKind::VerifyNewSigningAccess,
            FormKind::VerifySwitchAccess,
            FormKind::AddItem,
            FormKind::EditItem,
            FormKind::NewKit,
            FormKind::AddTracking,
            FormKind::TrackingResults,
            FormKind::TrackingInterval,
            FormKind::SigningDescription(BatchAction::SwitchSigning),
        ];
        for kind in kinds {
            assert!(!kind.fields().is_empty(), "{}", kind.title());
            assert_eq!(FormDraft::new(kind).values.len(), kind.fields().len());
        }
    }

    #[test]
    fn login_posts_personal_id_and_password() -> Result<()> {
        let mut draft = FormDraft::new(FormKind::Login);
        fill(&mut draft, "personal_id", " 1234567 ");
        fill(&mut draft, "password", "hunter2 ");
        let request = request(&draft)?;
        assert_eq!(request.action, ActionKind::Login);
        assert_eq!(
            request.body,
            json!({"personal_id": "1234567", "password": "hunter2 "})
        );
        Ok(())
    }

    #[test]
    fn non_numeric_integer_field_is_refused() {
        let mut draft = FormDraft::new(FormKind::Login);
        fill(&mut draft, "personal_id", "12ab");
        fill(&mut draft, "password", "x");
        let error = draft.submit().expect_err("letters should not parse");
        assert!(error.to_string().contains("personal id must be a whole number"));
    }

    #[test]
    fn client_account_requires_matching_passwords() {
        let mut draft = FormDraft::new(FormKind::CreateClientAccount);
        for (key, value) in [
            ("palga", "B"),
            ("team", "7"),
            ("first_name", "Noa"),
            ("last_name", "Bar"),
            ("personal_id", "7654321"),
            ("email", "noa@example.com"),
            ("password", "a"),
            ("confirm_password", "b"),
            ("master_password", "m"),
        ] {
            fill(&mut draft, key, value);
        }
        let error = draft.submit().expect_err("mismatch should fail");
        assert!(error.to_string().contains("passwords do not match"));

        fill(&mut draft, "confirm_password", "a");
        let request = request(&draft).expect("matching passwords should pass");
        assert_eq!(request.body["master_password"], "m");
        assert_eq!(request.body["palga"], "B");
    }

    #[test]
    fn edit_item_prefills_total_from_count_display() -> Result<()> {
        let rows = rows_from_json(
            &json!([{
                "object_id": "i1", "name": "radio", "category": "comms", "count": "3 / 10",
                "color": "green", "palga": "B", "mami_serial": "m1", "manufacture_mkt": "x",
                "katzi_mkt": "y", "serial_no": "s1", "description": "handheld"
            }]),
            "data",
            "object_id",
        )?;
        let (draft, warning) = FormDraft::edit_item(&rows[0]);
        assert_eq!(warning, None);
        assert_eq!(draft.value("total_count"), "10");
        assert_eq!(draft.value("name"), "radio");

        let request = request(&draft)?;
        assert_eq!(request.action, ActionKind::UpdateItem);
        assert_eq!(request.body["item_id"], "i1");
        assert_eq!(request.body["total_count"], "10");
        assert_eq!(request.body["description"], "handheld");
        Ok(())
    }

    #[test]
    fn malformed_count_leaves_total_empty_with_warning() -> Result<()> {
        let rows = rows_from_json(
            &json!([{"object_id": "i1", "name": "radio", "category": "comms", "count": "many"}]),
            "data",
            "object_id",
        )?;
        let (draft, warning) = FormDraft::edit_item(&rows[0]);
        assert_eq!(draft.value("total_count"), "");
        assert!(warning.is_some_and(|message| message.contains("enter the total count")));
        assert!(draft.submit().is_err());
        Ok(())
    }

    #[test]
    fn tracking_forms_need_a_target() {
        let mut draft = FormDraft::new(FormKind::TrackingResults);
        fill(&mut draft, "results", "pass");
        assert!(draft.submit().is_err());

        let mut draft = FormDraft::for_target(FormKind::TrackingResults, RowId::from("t1"));
        fill(&mut draft, "results", "pass");
        let request = request(&draft).expect("targeted form should submit");
        assert_eq!(request.body, json!({"object_id": "t1", "results": "pass"}));
    }

    #[test]
    fn tracking_interval_prefills_current_interval() -> Result<()> {
        let rows = rows_from_json(&json!([{"object_id": "t1", "interval": 30}]), "data", "object_id")?;
        let draft = FormDraft::tracking_interval(&rows[0]);
        assert_eq!(draft.value("interval"), "30");
        assert_eq!(draft.target, Some(RowId::from("t1")));
        Ok(())
    }

    #[test]
    fn signing_description_form_yields_batch() -> Result<()> {
        let mut draft = FormDraft::new(FormKind::SigningDescription(BatchAction::AddToPendingSignings));
        assert!(draft.submit().is_err());

        fill(&mut draft, "description", " field exercise ");
        assert_eq!(
            draft.submit()?,
            FormSubmission::Batch {
                batch: BatchAction::AddToPendingSignings,
                description: "field exercise".to_owned(),
            }
        );
        Ok(())
    }

    #[test]
    fn new_kit_requires_name() {
        let payload = FormPayload::NewKit(super::KitFormInput {
            kit_name: " ".to_owned(),
            palga: "B".to_owned(),
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn secret_fields_are_marked() {
        let kinds: Vec<FieldKind> = FormKind::Login.fields().iter().map(|field| field.kind).collect();
        assert_eq!(kinds, vec![FieldKind::Integer, FieldKind::Secret]);
    }
}
