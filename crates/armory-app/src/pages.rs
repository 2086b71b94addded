// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{
    BatchAction, FormKind, PageAction, Row, RowAction, RowSelectionState, RowValidity,
    SelectionPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Client,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Client => "client",
        }
    }

    /// Tab bar for the role, in display order.
    pub const fn pages(self) -> &'static [PageKind] {
        match self {
            Self::Master => &[
                PageKind::Inventory,
                PageKind::ManageInventory,
                PageKind::NewSigning,
                PageKind::PendingSignings,
                PageKind::Signings,
                PageKind::ApproveSwitch,
                PageKind::Kits,
                PageKind::AmplifierSelection,
                PageKind::AmplifierStatus,
                PageKind::AmplifierTodo,
                PageKind::ClientUsers,
                PageKind::ManageUsers,
                PageKind::Logs,
            ],
            Self::Client => &[
                PageKind::Inventory,
                PageKind::ClientSignings,
                PageKind::SwitchSigning,
                PageKind::ClientSwitchRequests,
            ],
        }
    }

    pub const fn landing_route(self) -> &'static str {
        match self {
            Self::Master => "/master_landing_page",
            Self::Client => "/client_landing_page",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Inventory,
    ManageInventory,
    NewSigning,
    PendingSignings,
    Signings,
    ApproveSwitch,
    Kits,
    KitContent,
    KitContentByItem,
    AmplifierSelection,
    AmplifierStatus,
    AmplifierTodo,
    ClientUsers,
    ManageUsers,
    Logs,
    ClientSignings,
    SwitchSigning,
    ClientSwitchRequests,
}

impl PageKind {
    pub const ALL: [Self; 18] = [
        Self::Inventory,
        Self::ManageInventory,
        Self::NewSigning,
        Self::PendingSignings,
        Self::Signings,
        Self::ApproveSwitch,
        Self::Kits,
        Self::KitContent,
        Self::KitContentByItem,
        Self::AmplifierSelection,
        Self::AmplifierStatus,
        Self::AmplifierTodo,
        Self::ClientUsers,
        Self::ManageUsers,
        Self::Logs,
        Self::ClientSignings,
        Self::SwitchSigning,
        Self::ClientSwitchRequests,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::ManageInventory => "manage",
            Self::NewSigning => "sign",
            Self::PendingSignings => "pending",
            Self::Signings => "signings",
            Self::ApproveSwitch => "approve",
            Self::Kits => "kits",
            Self::KitContent => "kit",
            Self::KitContentByItem => "kit items",
            Self::AmplifierSelection => "amp select",
            Self::AmplifierStatus => "amp status",
            Self::AmplifierTodo => "amp todo",
            Self::ClientUsers => "clients",
            Self::ManageUsers => "users",
            Self::Logs => "logs",
            Self::ClientSignings => "my signings",
            Self::SwitchSigning => "switch",
            Self::ClientSwitchRequests => "requests",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|page| page.label().eq_ignore_ascii_case(label))
    }

    /// Pages that need a parameter and are reached by drilling in, not
    /// from the tab bar.
    pub const fn is_detail(self) -> bool {
        matches!(self, Self::KitContent | Self::KitContentByItem)
    }

    pub fn spec(self) -> PageSpec {
        match self {
            Self::Inventory => PageSpec::read_only(
                "Inventory",
                ListingSource::Fixed("/collections-data/inventory"),
                "object_id",
                INVENTORY_COLUMNS,
            )
            .with_row_actions(&[RowAction::ShowKitContent]),
            Self::ManageInventory => PageSpec::read_only(
                "Manage inventory",
                ListingSource::Fixed("/collections-data/inventory"),
                "object_id",
                MANAGE_INVENTORY_COLUMNS,
            )
            .with_row_actions(&[RowAction::EditItem, RowAction::DeleteItem])
            .with_page_actions(&[PageAction::AddItem]),
            Self::NewSigning => PageSpec::read_only(
                "New signing",
                ListingSource::Fixed("/collections-data/inventory"),
                "object_id",
                NEW_SIGNING_COLUMNS,
            )
            .with_selection(SelectionSpec {
                policy: SelectionPolicy::AbortOnInvalid,
                quantity: Some(QuantitySpec {
                    max_key: "max_amount",
                    default: QuantityDefault::One,
                }),
                check_all_on_load: false,
                batches: &[BatchAction::AddToPendingSignings],
            })
            .with_page_actions(&[PageAction::VerifyNewSigningAccess]),
            Self::PendingSignings => PageSpec::read_only(
                "Pending signings",
                ListingSource::Fixed("/collections-data/pending_signings"),
                "object_id",
                PENDING_SIGNING_COLUMNS,
            )
            .with_selection(SelectionSpec {
                policy: SelectionPolicy::ExcludeInvalid,
                quantity: None,
                check_all_on_load: true,
                batches: &[BatchAction::AddToSignings],
            })
            .with_row_actions(&[RowAction::DeletePendingSigning]),
            Self::Signings => PageSpec::read_only(
                "Signings",
                ListingSource::Fixed("/collections-data/signings"),
                "object_id",
                SIGNING_COLUMNS,
            ),
            Self::ApproveSwitch => PageSpec::read_only(
                "Approve switch requests",
                ListingSource::Fixed("/collections-data/master_approve_switch_requests"),
                "request_id",
                APPROVE_SWITCH_COLUMNS,
            )
            .with_selection(SelectionSpec {
                policy: SelectionPolicy::ExcludeInvalid,
                quantity: None,
                check_all_on_load: false,
                batches: &[
                    BatchAction::ApproveSwitchRequests,
                    BatchAction::RejectSwitchRequests,
                ],
            }),
            Self::Kits => PageSpec::read_only(
                "Kits",
                ListingSource::Fixed("/collections-data/kits"),
                "kit_id",
                KIT_COLUMNS,
            )
            .with_row_actions(&[RowAction::OpenKitContent, RowAction::KitRemoveItems])
            .with_page_actions(&[PageAction::NewKit]),
            Self::KitContent => PageSpec::read_only(
                "Kit content",
                ListingSource::WithParam("/collections-data/kit_content/"),
                "object_id",
                KIT_CONTENT_COLUMNS,
            ),
            Self::KitContentByItem => PageSpec::read_only(
                "Kit content",
                ListingSource::WithParam("/collections-data/kit_content_item_based/"),
                "object_id",
                KIT_CONTENT_COLUMNS,
            ),
            Self::AmplifierSelection => PageSpec::read_only(
                "Amplifier selection",
                ListingSource::Fixed("/collections-data/inventory"),
                "object_id",
                MANAGE_INVENTORY_COLUMNS,
            )
            .with_row_actions(&[RowAction::TrackItem]),
            Self::AmplifierStatus => PageSpec::read_only(
                "Amplifier status",
                ListingSource::Fixed("/collections-data/amplifier_tracking"),
                "object_id",
                AMPLIFIER_STATUS_COLUMNS,
            )
            .with_row_actions(&[
                RowAction::UpdateResults,
                RowAction::ChangeInterval,
                RowAction::DeleteTracking,
            ]),
            Self::AmplifierTodo => PageSpec::read_only(
                "Amplifier todo",
                ListingSource::Fixed("/collections-data/amplifier_tracking_todo"),
                "object_id",
                AMPLIFIER_TODO_COLUMNS,
            ),
            Self::ClientUsers => PageSpec::read_only(
                "Client users",
                ListingSource::Fixed("/collections-data/client_users"),
                "user_id",
                CLIENT_USER_COLUMNS,
            )
            .with_page_actions(&[
                PageAction::CreateClientAccount,
                PageAction::CreateMasterAccount,
            ]),
            Self::ManageUsers => PageSpec::read_only(
                "Manage users",
                ListingSource::Fixed("/collections-data/update_client_users"),
                "user_id",
                MANAGE_USER_COLUMNS,
            )
            .with_row_actions(&[RowAction::DeleteClientUser]),
            Self::Logs => PageSpec::read_only(
                "Logs",
                ListingSource::Fixed("/collections-data/logs"),
                "object_id",
                LOG_COLUMNS,
            ),
            Self::ClientSignings => PageSpec::read_only(
                "My signings",
                ListingSource::Fixed("/collections-data/client_signings"),
                "signing_id",
                SIGNING_COLUMNS,
            )
            .with_page_actions(&[PageAction::VerifySwitchAccess]),
            Self::SwitchSigning => PageSpec::read_only(
                "Switch signing",
                ListingSource::Fixed("/collections-data/switch_signing"),
                "signing_id",
                SWITCH_SIGNING_COLUMNS,
            )
            .with_selection(SelectionSpec {
                policy: SelectionPolicy::AbortOnInvalid,
                quantity: Some(QuantitySpec {
                    max_key: "quantity",
                    default: QuantityDefault::Max,
                }),
                check_all_on_load: false,
                batches: &[BatchAction::SwitchSigning],
            })
            .with_page_actions(&[PageAction::VerifySwitchAccess]),
            Self::ClientSwitchRequests => PageSpec::read_only(
                "Switch requests",
                ListingSource::Fixed("/collections-data/client_switch_requests"),
                "request_id",
                CLIENT_SWITCH_REQUEST_COLUMNS,
            )
            .with_row_actions(&[RowAction::CancelSwitchRequest]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Fixed(&'static str),
    /// Prefix completed by the page parameter, e.g. a kit id.
    WithParam(&'static str),
}

impl ListingSource {
    pub fn endpoint(self, param: Option<&str>) -> Result<String> {
        match (self, param) {
            (Self::Fixed(path), _) => Ok(path.to_owned()),
            (Self::WithParam(prefix), Some(param)) if !param.trim().is_empty() => {
                Ok(format!("{prefix}{}", param.trim()))
            }
            (Self::WithParam(prefix), _) => {
                bail!("listing {prefix}<id> needs an id -- open it from a row and retry")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDefault {
    One,
    /// The row's max, e.g. the full signed quantity.
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantitySpec {
    pub max_key: &'static str,
    pub default: QuantityDefault,
}

impl QuantitySpec {
    pub fn initial_quantity(self, max_quantity: Option<i64>) -> Option<i64> {
        match self.default {
            QuantityDefault::One => Some(1),
            QuantityDefault::Max => max_quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpec {
    pub policy: SelectionPolicy,
    pub quantity: Option<QuantitySpec>,
    pub check_all_on_load: bool,
    pub batches: &'static [BatchAction],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRenderer {
    Plain,
    Checkbox,
    Quantity,
    Actions,
    /// Plain text that drills into kit content on kit rows.
    KitLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub renderer: CellRenderer,
}

impl ColumnSpec {
    pub const fn plain(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            renderer: CellRenderer::Plain,
        }
    }

    const fn rendered(key: &'static str, label: &'static str, renderer: CellRenderer) -> Self {
        Self {
            key,
            label,
            renderer,
        }
    }

    pub const fn orderable(self) -> bool {
        matches!(self.renderer, CellRenderer::Plain | CellRenderer::KitLink)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub title: &'static str,
    pub source: ListingSource,
    pub identity: &'static str,
    pub columns: &'static [ColumnSpec],
    pub selection: Option<SelectionSpec>,
    pub row_actions: &'static [RowAction],
    pub page_actions: &'static [PageAction],
}

impl PageSpec {
    const fn read_only(
        title: &'static str,
        source: ListingSource,
        identity: &'static str,
        columns: &'static [ColumnSpec],
    ) -> Self {
        Self {
            title,
            source,
            identity,
            columns,
            selection: None,
            row_actions: &[],
            page_actions: &[],
        }
    }

    const fn with_selection(mut self, selection: SelectionSpec) -> Self {
        self.selection = Some(selection);
        self
    }

    const fn with_row_actions(mut self, actions: &'static [RowAction]) -> Self {
        self.row_actions = actions;
        self
    }

    const fn with_page_actions(mut self, actions: &'static [PageAction]) -> Self {
        self.page_actions = actions;
        self
    }

    pub fn row_action_for_key(&self, key: char) -> Option<RowAction> {
        self.row_actions
            .iter()
            .copied()
            .find(|action| action.key() == key)
    }

    pub fn page_action_for_key(&self, key: char) -> Option<PageAction> {
        self.page_actions
            .iter()
            .copied()
            .find(|action| action.key() == key)
    }

    pub fn batch_for_key(&self, key: char) -> Option<BatchAction> {
        self.selection?
            .batches
            .iter()
            .copied()
            .find(|batch| batch.key() == key)
    }
}

/// Projection of one cell for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellView {
    Text(String),
    Checkbox { checked: bool, validity: RowValidity },
    Quantity { raw: String, validity: RowValidity },
    Link(String),
    Actions(String),
}

impl CellView {
    pub fn text(&self) -> String {
        match self {
            Self::Text(value) | Self::Link(value) | Self::Actions(value) => value.clone(),
            Self::Checkbox { checked: true, .. } => "[x]".to_owned(),
            Self::Checkbox { checked: false, .. } => "[ ]".to_owned(),
            Self::Quantity { raw, .. } => raw.clone(),
        }
    }

    pub fn validity(&self) -> RowValidity {
        match self {
            Self::Checkbox { validity, .. } | Self::Quantity { validity, .. } => *validity,
            _ => RowValidity::Unchecked,
        }
    }
}

pub fn render_cell(
    column: &ColumnSpec,
    row: &Row,
    selection: Option<&RowSelectionState>,
    actions: &[RowAction],
) -> CellView {
    let validity = selection.map_or(RowValidity::Unchecked, RowSelectionState::validity);
    match column.renderer {
        CellRenderer::Plain => CellView::Text(row.display(column.key)),
        CellRenderer::Checkbox => CellView::Checkbox {
            checked: selection.is_some_and(|state| state.checked),
            validity,
        },
        CellRenderer::Quantity => CellView::Quantity {
            raw: selection
                .map(|state| state.entered_quantity.clone())
                .unwrap_or_default(),
            validity,
        },
        CellRenderer::KitLink => {
            let text = row.display(column.key);
            if is_kit_row(row) {
                CellView::Link(text)
            } else {
                CellView::Text(text)
            }
        }
        CellRenderer::Actions => CellView::Actions(
            actions
                .iter()
                .filter(|action| action.applies_to(row))
                .map(|action| format!("{}:{}", action.key(), action.label()))
                .collect::<Vec<_>>()
                .join(" "),
        ),
    }
}

pub fn is_kit_row(row: &Row) -> bool {
    row.display("category").trim().eq_ignore_ascii_case("kit")
}

/// A page together with its parameter, if it takes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub page: PageKind,
    pub param: Option<String>,
}

impl PageTarget {
    pub fn new(page: PageKind) -> Self {
        Self { page, param: None }
    }

    pub fn with_param(page: PageKind, param: impl Into<String>) -> Self {
        Self {
            page,
            param: Some(param.into()),
        }
    }

    pub fn endpoint(&self) -> Result<String> {
        self.page.spec().source.endpoint(self.param.as_deref())
    }

    pub fn title(&self) -> String {
        let title = self.page.spec().title;
        match &self.param {
            Some(param) => format!("{title} {param}"),
            None => title.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Landing(Role),
    Page(PageTarget),
    Form(FormKind),
    Unknown(String),
}

/// Maps a redirect URL to the screen that shows it. Absolute URLs and
/// query strings are accepted; only the path is matched.
pub fn resolve_route(url: &str) -> RouteTarget {
    let path = route_path(url);
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let page = |kind| RouteTarget::Page(PageTarget::new(kind));

    match segments.as_slice() {
        [] => RouteTarget::Form(FormKind::Login),
        ["master_landing_page"] => RouteTarget::Landing(Role::Master),
        ["client_landing_page"] => RouteTarget::Landing(Role::Client),
        ["master_signup"] => RouteTarget::Form(FormKind::CreateMasterAccount),
        ["client_signup"] => RouteTarget::Form(FormKind::CreateClientAccount),
        ["master", "inventory"] | ["client", "inventory"] => page(PageKind::Inventory),
        ["master", "update_inventory"] => page(PageKind::ManageInventory),
        ["master", "new_signing"] => page(PageKind::NewSigning),
        ["master", "verify-new-signing-access"] => {
            RouteTarget::Form(FormKind::VerifyNewSigningAccess)
        }
        ["master", "pending_signings"] => page(PageKind::PendingSignings),
        ["master", "signings"] => page(PageKind::Signings),
        ["master", "approve_switch_requests"] => page(PageKind::ApproveSwitch),
        ["master", "kits"] => page(PageKind::Kits),
        ["master", "kit_content", kit_id] => RouteTarget::Page(PageTarget::with_param(
            PageKind::KitContent,
            (*kit_id).to_owned(),
        )),
        ["master", "amplifier_selection"] => page(PageKind::AmplifierSelection),
        ["master", "amplifier_status"] => page(PageKind::AmplifierStatus),
        ["master", "amplifier_todo"] => page(PageKind::AmplifierTodo),
        ["master", "client_users"] => page(PageKind::ClientUsers),
        ["master", "update_users"] => page(PageKind::ManageUsers),
        ["master", "logs"] => page(PageKind::Logs),
        ["client", "signings"] => page(PageKind::ClientSignings),
        ["client", "switch_signing"] => page(PageKind::SwitchSigning),
        ["client", "verify-switch-signing-access"] => RouteTarget::Form(FormKind::VerifySwitchAccess),
        ["client", "switch_requests"] => page(PageKind::ClientSwitchRequests),
        _ => RouteTarget::Unknown(path.to_owned()),
    }
}

fn route_path(url: &str) -> &str {
    let without_origin = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |index| &rest[index..]),
        None => url,
    };
    without_origin
        .split(['?', '#'])
        .next()
        .unwrap_or(without_origin)
}

const INVENTORY_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::rendered("name", "name", CellRenderer::KitLink),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("count", "count"),
    ColumnSpec::plain("color", "color"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("manufacture_mkt", "mfr mkt"),
    ColumnSpec::plain("katzi_mkt", "katzi mkt"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("description", "description"),
];

const MANAGE_INVENTORY_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("count", "count"),
    ColumnSpec::plain("color", "color"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("manufacture_mkt", "mfr mkt"),
    ColumnSpec::plain("katzi_mkt", "katzi mkt"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("description", "description"),
    ColumnSpec::rendered("object_id", "actions", CellRenderer::Actions),
];

const NEW_SIGNING_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::rendered("object_id", "sel", CellRenderer::Checkbox),
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("count", "count"),
    ColumnSpec::plain("color", "color"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("description", "description"),
    ColumnSpec::plain("max_amount", "max"),
    ColumnSpec::rendered("max_amount", "qty", CellRenderer::Quantity),
];

const PENDING_SIGNING_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::rendered("object_id", "sel", CellRenderer::Checkbox),
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("quantity", "qty"),
    ColumnSpec::plain("color", "color"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("item_description", "item"),
    ColumnSpec::plain("signer", "signer"),
    ColumnSpec::plain("issuer", "issuer"),
    ColumnSpec::plain("signing_description", "signing"),
    ColumnSpec::rendered("object_id", "actions", CellRenderer::Actions),
];

const SIGNING_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("signer", "signer"),
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("quantity", "qty"),
    ColumnSpec::plain("color", "color"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("item_description", "item"),
    ColumnSpec::plain("signing_description", "signing"),
    ColumnSpec::plain("issuer", "issuer"),
    ColumnSpec::plain("date", "date"),
];

const SWITCH_SIGNING_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::rendered("signing_id", "sel", CellRenderer::Checkbox),
    ColumnSpec::plain("signer", "signer"),
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("quantity", "signed"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("item_description", "item"),
    ColumnSpec::plain("signing_description", "signing"),
    ColumnSpec::plain("issuer", "issuer"),
    ColumnSpec::plain("date", "date"),
    ColumnSpec::rendered("quantity", "qty", CellRenderer::Quantity),
];

const APPROVE_SWITCH_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::rendered("request_id", "sel", CellRenderer::Checkbox),
    ColumnSpec::plain("signer", "signer"),
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("quantity", "qty"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("signing_description", "signing"),
    ColumnSpec::plain("new_signer", "new signer"),
    ColumnSpec::plain("switch_description", "switch"),
    ColumnSpec::plain("status", "status"),
];

const CLIENT_SWITCH_REQUEST_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("signer", "signer"),
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("quantity", "qty"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("signing_description", "signing"),
    ColumnSpec::plain("new_signer", "new signer"),
    ColumnSpec::plain("switch_description", "switch"),
    ColumnSpec::plain("status", "status"),
    ColumnSpec::rendered("request_id", "actions", CellRenderer::Actions),
];

const KIT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("kit_name", "kit"),
    ColumnSpec::plain("kit_description", "description"),
    ColumnSpec::rendered("kit_id", "actions", CellRenderer::Actions),
];

const KIT_CONTENT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("quantity", "qty"),
    ColumnSpec::plain("color", "color"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("manufacture_mkt", "mfr mkt"),
    ColumnSpec::plain("katzi_mkt", "katzi mkt"),
    ColumnSpec::plain("serial_no", "serial"),
    ColumnSpec::plain("item_description", "item"),
];

const AMPLIFIER_STATUS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("description", "description"),
    ColumnSpec::plain("test_type", "test"),
    ColumnSpec::plain("interval", "interval"),
    ColumnSpec::plain("results", "results"),
    ColumnSpec::plain("last_updated", "updated"),
    ColumnSpec::rendered("object_id", "actions", CellRenderer::Actions),
];

const AMPLIFIER_TODO_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("name", "name"),
    ColumnSpec::plain("category", "category"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("mami_serial", "mami serial"),
    ColumnSpec::plain("test_type", "test"),
    ColumnSpec::plain("interval", "interval"),
    ColumnSpec::plain("results", "results"),
    ColumnSpec::plain("last_updated", "updated"),
    ColumnSpec::plain("days_passed", "days"),
];

const CLIENT_USER_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("first_name", "first"),
    ColumnSpec::plain("last_name", "last"),
    ColumnSpec::plain("personal_id", "personal id"),
    ColumnSpec::plain("email", "email"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("team", "team"),
];

const MANAGE_USER_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("first_name", "first"),
    ColumnSpec::plain("last_name", "last"),
    ColumnSpec::plain("personal_id", "personal id"),
    ColumnSpec::plain("email", "email"),
    ColumnSpec::plain("palga", "palga"),
    ColumnSpec::plain("team", "team"),
    ColumnSpec::rendered("user_id", "actions", CellRenderer::Actions),
];

const LOG_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::plain("action", "action"),
    ColumnSpec::plain("description", "description"),
    ColumnSpec::plain("date", "date"),
];

#[cfg(test)]
mod tests {
    use super::{
        CellRenderer, CellView, ListingSource, PageKind, PageTarget, Role, RouteTarget,
        render_cell, resolve_route,
    };
    use crate::{
        FormKind, RowAction, RowSelectionState, RowValidity, SelectionPolicy, rows_from_json,
    };
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn every_role_page_is_a_tab_page() {
        for role in [Role::Master, Role::Client] {
            for page in role.pages() {
                assert!(!page.is_detail(), "{} should not be a detail page", page.label());
            }
        }
    }

    #[test]
    fn page_labels_parse_back() {
        for page in PageKind::ALL {
            assert_eq!(PageKind::parse(page.label()), Some(page));
        }
        assert_eq!(PageKind::parse(" Inventory "), Some(PageKind::Inventory));
        assert_eq!(PageKind::parse("nope"), None);
    }

    #[test]
    fn quantity_pages_abort_and_checkbox_pages_exclude() {
        let policy = |page: PageKind| page.spec().selection.map(|selection| selection.policy);
        assert_eq!(policy(PageKind::NewSigning), Some(SelectionPolicy::AbortOnInvalid));
        assert_eq!(policy(PageKind::SwitchSigning), Some(SelectionPolicy::AbortOnInvalid));
        assert_eq!(policy(PageKind::ApproveSwitch), Some(SelectionPolicy::ExcludeInvalid));
        assert_eq!(policy(PageKind::PendingSignings), Some(SelectionPolicy::ExcludeInvalid));
        assert_eq!(policy(PageKind::Logs), None);
    }

    #[test]
    fn only_quantity_pages_have_quantity_columns() {
        for page in PageKind::ALL {
            let spec = page.spec();
            let has_column = spec
                .columns
                .iter()
                .any(|column| column.renderer == CellRenderer::Quantity);
            let tracks = spec.selection.and_then(|selection| selection.quantity).is_some();
            assert_eq!(has_column, tracks, "{}", page.label());
        }
    }

    #[test]
    fn only_pending_signings_checks_all_on_load() {
        for page in PageKind::ALL {
            let check_all = page
                .spec()
                .selection
                .is_some_and(|selection| selection.check_all_on_load);
            assert_eq!(check_all, page == PageKind::PendingSignings);
        }
    }

    #[test]
    fn parameterized_listing_needs_param() -> Result<()> {
        let source = ListingSource::WithParam("/collections-data/kit_content/");
        assert_eq!(source.endpoint(Some("k9"))?, "/collections-data/kit_content/k9");
        assert!(source.endpoint(None).is_err());
        assert!(source.endpoint(Some(" ")).is_err());
        assert_eq!(
            PageTarget::new(PageKind::Logs).endpoint()?,
            "/collections-data/logs"
        );
        Ok(())
    }

    #[test]
    fn routes_resolve_to_pages_and_forms() {
        assert_eq!(resolve_route("/"), RouteTarget::Form(FormKind::Login));
        assert_eq!(
            resolve_route("/master/pending_signings"),
            RouteTarget::Page(PageTarget::new(PageKind::PendingSignings))
        );
        assert_eq!(
            resolve_route("http://localhost:8000/master/signings?tab=1"),
            RouteTarget::Page(PageTarget::new(PageKind::Signings))
        );
        assert_eq!(
            resolve_route("/master/kit_content/abc"),
            RouteTarget::Page(PageTarget::with_param(PageKind::KitContent, "abc"))
        );
        assert_eq!(
            resolve_route("/client_landing_page"),
            RouteTarget::Landing(Role::Client)
        );
        assert_eq!(
            resolve_route("/client/switch_signing"),
            RouteTarget::Page(PageTarget::new(PageKind::SwitchSigning))
        );
        assert_eq!(
            resolve_route("/master/verify-new-signing-access"),
            RouteTarget::Form(FormKind::VerifyNewSigningAccess)
        );
        assert_eq!(
            resolve_route("/somewhere/else"),
            RouteTarget::Unknown("/somewhere/else".to_owned())
        );
    }

    #[test]
    fn cells_project_row_and_selection() -> Result<()> {
        let rows = rows_from_json(
            &json!([
                {"object_id": "i1", "name": "field kit", "category": "kit", "max_amount": 2},
                {"object_id": "i2", "name": "radio", "category": "comms", "max_amount": 2},
            ]),
            "data",
            "object_id",
        )?;
        let spec = PageKind::NewSigning.spec();
        let checkbox = &spec.columns[0];
        let quantity = spec
            .columns
            .iter()
            .find(|column| column.renderer == CellRenderer::Quantity)
            .expect("new signing has a quantity column");
        let state = RowSelectionState {
            checked: true,
            entered_quantity: "3".to_owned(),
            max_quantity: Some(2),
            requires_quantity: true,
        };

        assert_eq!(
            render_cell(checkbox, &rows[0], Some(&state), &[]),
            CellView::Checkbox {
                checked: true,
                validity: RowValidity::InvalidChecked
            }
        );
        assert_eq!(
            render_cell(quantity, &rows[0], Some(&state), &[]).text(),
            "3"
        );

        let inventory = PageKind::Inventory.spec();
        assert_eq!(
            render_cell(&inventory.columns[0], &rows[0], None, &[]),
            CellView::Link("field kit".to_owned())
        );
        assert_eq!(
            render_cell(&inventory.columns[0], &rows[1], None, &[]),
            CellView::Text("radio".to_owned())
        );
        Ok(())
    }

    #[test]
    fn action_cells_list_key_and_label() -> Result<()> {
        let rows = rows_from_json(&json!([{"object_id": "a"}]), "data", "object_id")?;
        let spec = PageKind::ManageInventory.spec();
        let actions = spec
            .columns
            .last()
            .expect("manage inventory has an actions column");
        let text = render_cell(actions, &rows[0], None, spec.row_actions).text();
        assert!(text.contains(&format!(
            "{}:{}",
            RowAction::EditItem.key(),
            RowAction::EditItem.label()
        )));
        assert!(text.contains(RowAction::DeleteItem.label()));
        Ok(())
    }
}
