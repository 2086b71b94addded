// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{
    AlertRegion, AlertTone, FormKind, PageKind, PageTarget, ResponseOutcome, Role, RouteTarget,
    resolve_route,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    /// Typing a quantity into the selected row.
    Quantity,
    Search,
    Form(FormKind),
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub role: Role,
    pub mode: AppMode,
    pub active: PageTarget,
    /// Tab page to return to from a detail page.
    pub parent: Option<PageTarget>,
    pub alert: AlertRegion,
    pub status_line: Option<String>,
    pub in_flight: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::for_role(Role::Master, PageKind::Inventory)
    }
}

impl AppState {
    pub fn for_role(role: Role, start: PageKind) -> Self {
        let start = if role.pages().contains(&start) {
            start
        } else {
            role.pages()[0]
        };
        Self {
            role,
            mode: AppMode::Nav,
            active: PageTarget::new(start),
            parent: None,
            alert: AlertRegion::default(),
            status_line: None,
            in_flight: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextPage,
    PrevPage,
    OpenPage(PageTarget),
    Back,
    EnterQuantityEdit,
    EnterSearch,
    OpenForm(FormKind),
    RequestConfirmation,
    ExitToNav,
    BeginSubmission,
    ApplyOutcome(ResponseOutcome),
    ShowAlert(AlertTone, String),
    DismissAlert,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    PageChanged(PageTarget),
    RoleChanged(Role),
    ReloadRequested(PageTarget),
    AlertShown(AlertTone),
    AlertDismissed,
    SubmissionRejected,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextPage => self.rotate_page(1),
            AppCommand::PrevPage => self.rotate_page(-1),
            AppCommand::OpenPage(target) => self.navigate(target),
            AppCommand::Back => match self.parent.take() {
                Some(parent) => self.navigate(parent),
                None => vec![self.set_status("already at top")],
            },
            AppCommand::EnterQuantityEdit => self.set_mode(AppMode::Quantity),
            AppCommand::EnterSearch => self.set_mode(AppMode::Search),
            AppCommand::OpenForm(kind) => self.set_mode(AppMode::Form(kind)),
            AppCommand::RequestConfirmation => self.set_mode(AppMode::Confirm),
            AppCommand::ExitToNav => {
                let mut events = self.set_mode(AppMode::Nav);
                events.push(self.set_status("nav"));
                events
            }
            AppCommand::BeginSubmission => {
                if self.in_flight {
                    return vec![
                        AppEvent::SubmissionRejected,
                        self.set_status("request in flight -- wait for it to finish"),
                    ];
                }
                self.in_flight = true;
                vec![self.set_status("sending")]
            }
            AppCommand::ApplyOutcome(outcome) => self.apply_outcome(outcome),
            AppCommand::ShowAlert(tone, text) => {
                self.alert.show(tone, text, OffsetDateTime::now_utc());
                vec![AppEvent::AlertShown(tone)]
            }
            AppCommand::DismissAlert => {
                self.alert.dismiss();
                vec![AppEvent::AlertDismissed]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Redirects switch page and leave the banner alone. Everything else
    /// lands in the banner; a successful form closes.
    fn apply_outcome(&mut self, outcome: ResponseOutcome) -> Vec<AppEvent> {
        self.in_flight = false;
        match outcome {
            ResponseOutcome::Redirect(url) => self.follow_redirect(&url),
            outcome => {
                let mut events = Vec::new();
                if self.alert.present(&outcome, OffsetDateTime::now_utc()) {
                    events.push(AppEvent::AlertShown(self.alert.tone));
                }
                let closes_form = !outcome.is_failure() || self.mode == AppMode::Confirm;
                if closes_form && self.mode != AppMode::Nav {
                    events.extend(self.set_mode(AppMode::Nav));
                }
                events
            }
        }
    }

    fn follow_redirect(&mut self, url: &str) -> Vec<AppEvent> {
        match resolve_route(url) {
            RouteTarget::Landing(role) => {
                let mut events = Vec::new();
                if role != self.role {
                    self.role = role;
                    events.push(AppEvent::RoleChanged(role));
                }
                self.parent = None;
                events.extend(self.navigate(PageTarget::new(role.pages()[0])));
                events
            }
            RouteTarget::Page(target) => self.navigate(target),
            RouteTarget::Form(kind) => self.set_mode(AppMode::Form(kind)),
            RouteTarget::Unknown(path) => {
                let mut events = Vec::new();
                if self.mode != AppMode::Nav {
                    events.extend(self.set_mode(AppMode::Nav));
                }
                events.push(self.set_status(&format!("no page for {path} -- reloading")));
                events.push(AppEvent::ReloadRequested(self.active.clone()));
                events
            }
        }
    }

    fn navigate(&mut self, target: PageTarget) -> Vec<AppEvent> {
        if target.page.is_detail() {
            if !self.active.page.is_detail() {
                self.parent = Some(self.active.clone());
            }
        } else {
            self.parent = None;
        }
        self.active = target;
        let mut events = Vec::new();
        if self.mode != AppMode::Nav {
            events.extend(self.set_mode(AppMode::Nav));
        }
        events.push(AppEvent::PageChanged(self.active.clone()));
        events.push(AppEvent::ReloadRequested(self.active.clone()));
        events
    }

    fn rotate_page(&mut self, delta: isize) -> Vec<AppEvent> {
        let pages = self.role.pages();
        let anchor = self
            .parent
            .as_ref()
            .map_or(self.active.page, |parent| parent.page);
        let current = pages
            .iter()
            .position(|page| *page == anchor)
            .unwrap_or(0) as isize;
        let len = pages.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.navigate(PageTarget::new(pages[next]))
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
