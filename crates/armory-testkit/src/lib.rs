// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use armory_app::{DEFAULT_DATA_FIELD, PageKind, Row, rows_from_json};
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use time::macros::format_description;
use time::{Duration, OffsetDateTime};
use tiny_http::{Header, Response, Server};

const ITEM_NAMES: [&str; 14] = [
    "Radio PRC-152",
    "Night Vision Goggles",
    "Binoculars",
    "Field Telephone",
    "Antenna Mast",
    "Amplifier RF-7800",
    "Battery Charger",
    "GPS Receiver",
    "Headset",
    "Thermal Scope",
    "Laser Rangefinder",
    "Generator 2kW",
    "Cable Reel",
    "Tactical Tablet",
];

const CATEGORIES: [&str; 6] = ["comms", "optics", "power", "navigation", "amplifier", "kit"];

const KIT_NAMES: [&str; 8] = [
    "Patrol Kit",
    "Signal Kit",
    "Medic Kit",
    "Observation Kit",
    "Recon Kit",
    "Repair Kit",
    "Relay Kit",
    "Command Kit",
];

const COLORS: [&str; 5] = ["green", "black", "tan", "grey", "olive"];
const PALGOT: [&str; 6] = ["A", "B", "C", "D", "HQ", "Support"];
const TEAMS: [&str; 5] = ["1", "2", "3", "4", "5"];
const TEST_TYPES: [&str; 3] = ["power output", "noise floor", "gain"];
const STATUSES: [&str; 3] = ["pending", "approved", "rejected"];
const LOG_ACTIONS: [&str; 5] = [
    "new signing",
    "switch request",
    "item added",
    "item updated",
    "user deleted",
];

const FIRST_NAMES: [&str; 12] = [
    "Noa", "Yael", "Omer", "Itai", "Maya", "Amit", "Shira", "Eden", "Lior", "Tal", "Roni",
    "Dana",
];
const LAST_NAMES: [&str; 12] = [
    "Levi", "Cohen", "Mizrahi", "Peretz", "Biton", "Dahan", "Avraham", "Friedman", "Azulay",
    "Katz", "Malka", "Amar",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic listing rows shaped like the backend's collections.
#[derive(Debug, Clone)]
pub struct ArmoryFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl ArmoryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn inventory_item(&mut self) -> Value {
        let object_id = self.object_id();
        let total = self.int_range(1, 40);
        let available = self.int_range(0, total);
        json!({
            "object_id": object_id,
            "name": self.pick(&ITEM_NAMES),
            "category": self.pick(&CATEGORIES),
            "count": format!("{available} / {total}"),
            "color": self.pick(&COLORS),
            "palga": self.pick(&PALGOT),
            "mami_serial": self.serial("M"),
            "manufacture_mkt": self.serial("MK"),
            "katzi_mkt": self.serial("KZ"),
            "serial_no": self.serial("SN"),
            "description": self.sentence(),
            "max_amount": available,
        })
    }

    pub fn signing(&mut self) -> Value {
        let mut row = self.signed_item();
        let id = self.object_id();
        row["object_id"] = json!(id);
        row["signing_id"] = json!(id);
        row["issuer"] = json!(self.full_name());
        row["date"] = json!(self.date());
        row
    }

    pub fn pending_signing(&mut self) -> Value {
        let mut row = self.signed_item();
        row["object_id"] = json!(self.object_id());
        row["issuer"] = json!(self.full_name());
        row
    }

    pub fn switch_request(&mut self) -> Value {
        let mut row = self.signed_item();
        row["request_id"] = json!(self.object_id());
        row["new_signer"] = json!(self.full_name());
        row["switch_description"] = json!(self.sentence());
        row["status"] = json!(self.pick(&STATUSES));
        row
    }

    pub fn kit(&mut self) -> Value {
        json!({
            "kit_id": self.object_id(),
            "kit_name": self.pick(&KIT_NAMES),
            "kit_description": self.sentence(),
        })
    }

    pub fn client_user(&mut self) -> Value {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        json!({
            "user_id": self.object_id(),
            "first_name": first,
            "last_name": last,
            "personal_id": self.int_range(1_000_000, 9_999_999),
            "email": format!("{}.{}@unit.example", first.to_lowercase(), last.to_lowercase()),
            "palga": self.pick(&PALGOT),
            "team": self.pick(&TEAMS),
        })
    }

    pub fn amplifier_tracking(&mut self) -> Value {
        json!({
            "object_id": self.object_id(),
            "name": self.pick(&ITEM_NAMES),
            "category": "amplifier",
            "color": self.pick(&COLORS),
            "palga": self.pick(&PALGOT),
            "mami_serial": self.serial("M"),
            "description": self.sentence(),
            "test_type": self.pick(&TEST_TYPES),
            "interval": self.int_range(7, 90),
            "results": self.sentence(),
            "last_updated": self.date(),
            "days_passed": self.int_range(0, 120),
        })
    }

    pub fn log_entry(&mut self) -> Value {
        json!({
            "action": self.pick(&LOG_ACTIONS),
            "description": self.sentence(),
            "date": self.date(),
        })
    }

    /// Listing body for `page` with `count` rows.
    pub fn listing(&mut self, page: PageKind, count: usize) -> Value {
        let rows = (0..count).map(|_| self.row_for(page)).collect();
        Value::Array(rows)
    }

    fn row_for(&mut self, page: PageKind) -> Value {
        match page {
            PageKind::Inventory
            | PageKind::ManageInventory
            | PageKind::NewSigning
            | PageKind::AmplifierSelection => self.inventory_item(),
            PageKind::PendingSignings => self.pending_signing(),
            PageKind::Signings | PageKind::ClientSignings | PageKind::SwitchSigning => {
                self.signing()
            }
            PageKind::KitContent | PageKind::KitContentByItem => self.pending_signing(),
            PageKind::ApproveSwitch | PageKind::ClientSwitchRequests => self.switch_request(),
            PageKind::Kits => self.kit(),
            PageKind::AmplifierStatus | PageKind::AmplifierTodo => self.amplifier_tracking(),
            PageKind::ClientUsers | PageKind::ManageUsers => self.client_user(),
            PageKind::Logs => self.log_entry(),
        }
    }

    fn signed_item(&mut self) -> Value {
        json!({
            "signer": self.full_name(),
            "name": self.pick(&ITEM_NAMES),
            "category": self.pick(&CATEGORIES),
            "quantity": self.int_range(1, 12),
            "color": self.pick(&COLORS),
            "palga": self.pick(&PALGOT),
            "mami_serial": self.serial("M"),
            "manufacture_mkt": self.serial("MK"),
            "katzi_mkt": self.serial("KZ"),
            "serial_no": self.serial("SN"),
            "item_description": self.sentence(),
            "signing_description": self.sentence(),
        })
    }

    fn object_id(&mut self) -> String {
        let id = format!("{:024x}", (self.next_id << 32) | (self.rng.next_u64() & 0xFFFF_FFFF));
        self.next_id += 1;
        id
    }

    fn full_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn serial(&mut self, prefix: &str) -> String {
        format!("{prefix}-{:05}", self.int_range(0, 99_999))
    }

    fn date(&mut self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
        let days = self.int_range(0, 365);
        let minutes = self.int_range(0, 24 * 60 - 1);
        (reference_now() - Duration::days(days) + Duration::minutes(minutes))
            .format(&format)
            .unwrap_or_default()
    }

    fn sentence(&mut self) -> String {
        const WORDS: [&str; 16] = [
            "checked", "returned", "field", "exercise", "spare", "serviced", "night", "patrol",
            "training", "storage", "repaired", "issued", "backup", "relay", "north", "base",
        ];
        let count = 2 + self.int_n(4);
        let words: Vec<&str> = (0..count).map(|_| self.pick(&WORDS)).collect();
        words.join(" ")
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

fn reference_now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_767_225_600).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Decoded rows for `page`, the way the client would load them.
pub fn fixture_rows(page: PageKind, count: usize, seed: u64) -> Result<Vec<Row>> {
    let body = ArmoryFaker::new(seed).listing(page, count);
    rows_from_json(&body, DEFAULT_DATA_FIELD, page.spec().identity)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
    pub cookie: Option<String>,
}

impl RecordedRequest {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body)
            .with_context(|| format!("{} {} body is not JSON", self.method, self.path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl ScriptedResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            headers: vec![("Content-Type".to_owned(), "text/html".to_owned())],
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            body: String::new(),
            headers: vec![("Location".to_owned(), location.to_owned())],
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    fn to_response(&self) -> Result<Response<std::io::Cursor<Vec<u8>>>> {
        let mut response = Response::from_string(self.body.clone()).with_status_code(self.status);
        for (name, value) in &self.headers {
            let header = Header::from_bytes(name.as_bytes(), value.as_bytes())
                .map_err(|()| anyhow!("invalid header {name}: {value}"))?;
            response.add_header(header);
        }
        Ok(response)
    }
}

type Routes = BTreeMap<String, VecDeque<ScriptedResponse>>;

/// Scripted backend on a loopback port. Each path answers with its queued
/// responses in order and keeps repeating the last one. Unknown paths get
/// a FastAPI-style 404.
pub struct MockBackend {
    base_url: String,
    server: Arc<Server>,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockBackend {
    pub fn start() -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock backend: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let routes: Arc<Mutex<Routes>> = Arc::default();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();

        let handle = {
            let server = Arc::clone(&server);
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            thread::spawn(move || serve(&server, &routes, &requests))
        };

        Ok(Self {
            base_url,
            server,
            routes,
            requests,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self, path: &str, response: ScriptedResponse) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(path.to_owned()).or_default().push_back(response);
        }
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(server: &Server, routes: &Mutex<Routes>, requests: &Mutex<Vec<RecordedRequest>>) {
    for mut request in server.incoming_requests() {
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let path = request
            .url()
            .split('?')
            .next()
            .unwrap_or_default()
            .to_owned();
        let cookie = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Cookie"))
            .map(|header| header.value.as_str().to_owned());
        if let Ok(mut recorded) = requests.lock() {
            recorded.push(RecordedRequest {
                method: request.method().to_string(),
                path: path.clone(),
                body,
                cookie,
            });
        }

        let scripted = routes.lock().ok().and_then(|mut routes| {
            let queue = routes.get_mut(&path)?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });
        let scripted =
            scripted.unwrap_or_else(|| ScriptedResponse::json(404, json!({"detail": "Not Found"})));
        let response = match scripted.to_response() {
            Ok(response) => response,
            Err(_) => Response::from_string("bad scripted header").with_status_code(500),
        };
        let _ = request.respond(response);
    }
}

#[cfg(test)]
mod tests {
    use super::{ArmoryFaker, MockBackend, ScriptedResponse, fixture_rows};
    use anyhow::Result;
    use armory_app::{PageKind, parse_count_total};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    #[test]
    fn new_deterministic_seed() {
        let mut left = ArmoryFaker::new(42);
        let mut right = ArmoryFaker::new(42);
        assert_eq!(left.inventory_item(), right.inventory_item());
    }

    #[test]
    fn inventory_count_parses_and_bounds_max() -> Result<()> {
        let mut faker = ArmoryFaker::new(7);
        for _ in 0..50 {
            let item = faker.inventory_item();
            let count = item["count"].as_str().expect("count is a string");
            let total = parse_count_total(count)?;
            let max = item["max_amount"].as_i64().expect("max is a number");
            assert!((0..=total).contains(&max));
        }
        Ok(())
    }

    #[test]
    fn ids_are_unique_within_a_listing() -> Result<()> {
        for page in PageKind::ALL {
            let rows = fixture_rows(page, 40, 3)?;
            let ids: BTreeSet<_> = rows.iter().map(|row| row.id.clone()).collect();
            assert_eq!(ids.len(), rows.len(), "{}", page.label());
        }
        Ok(())
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = ArmoryFaker::new(seed);
            names.insert(faker.inventory_item()["name"].to_string());
        }
        assert!(names.len() >= 6, "got {}", names.len());
    }

    #[test]
    fn int_n() {
        let mut faker = ArmoryFaker::new(42);
        for _ in 0..100 {
            assert!(faker.int_n(5) < 5);
        }
    }

    fn raw_post(base_url: &str, path: &str, body: &str) -> Result<String> {
        let addr = base_url.trim_start_matches("http://");
        let mut stream = TcpStream::connect(addr)?;
        write!(
            stream,
            "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )?;
        let mut response = String::new();
        stream.read_to_string(&mut response)?;
        Ok(response)
    }

    #[test]
    fn mock_backend_records_and_replays_in_order() -> Result<()> {
        let backend = MockBackend::start()?;
        backend
            .route("/master/new_kit", ScriptedResponse::json(400, json!({"detail": "taken"})))
            .route("/master/new_kit", ScriptedResponse::json(200, json!({"message": "ok"})));

        let first = raw_post(backend.base_url(), "/master/new_kit", r#"{"kit_name":"a"}"#)?;
        let second = raw_post(backend.base_url(), "/master/new_kit", r#"{"kit_name":"b"}"#)?;
        let third = raw_post(backend.base_url(), "/master/new_kit", r#"{"kit_name":"c"}"#)?;
        let missing = raw_post(backend.base_url(), "/nope", "{}")?;

        assert!(first.starts_with("HTTP/1.1 400"));
        assert!(second.starts_with("HTTP/1.1 200"));
        assert!(third.starts_with("HTTP/1.1 200"));
        assert!(missing.starts_with("HTTP/1.1 404"));

        let recorded = backend.requests_to("/master/new_kit");
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].method, "POST");
        assert_eq!(recorded[1].json()?, json!({"kit_name": "b"}));
        Ok(())
    }
}
