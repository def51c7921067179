use chrono::{Duration, NaiveDateTime};
use rand::{Rng, seq::IndexedRandom};

pub const HEADER: &str = "ip,timestamp,url,status,user_agent";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PATHS: [(&str, u8); 7] = [
    ("/home", 30),
    ("/products", 20),
    ("/about", 10),
    ("/contact", 5),
    ("/login", 10),
    ("/api/orders", 15),
    ("/admin", 2),
];
const STATUS: [(u16, u8); 6] = [
    (200, 70),
    (201, 5),
    (301, 5),
    (401, 5),
    (404, 10),
    (500, 3),
];
const AGENTS: [(&str, u8); 5] = [
    ("Mozilla/5.0", 40),
    ("Chrome/90.0", 30),
    ("Safari/14.0", 15),
    ("curl/8.0", 10),
    ("python-requests/2.31", 5),
];
// A few clients that mostly hit missing or failing pages.
const SCANNERS: [&str; 3] = ["203.0.113.7", "198.51.100.23", "192.0.2.99"];
const SCAN_RATE: f64 = 0.05;

/// Produces rows with non-decreasing timestamps starting at `start`.
pub struct RowGenerator {
    now: NaiveDateTime,
    max_gap_secs: u32,
    malformed_ratio: f64,
}

impl RowGenerator {
    pub fn new(start: NaiveDateTime, max_gap_secs: u32, malformed_ratio: f64) -> Self {
        Self {
            now: start,
            max_gap_secs,
            malformed_ratio: malformed_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn next_row<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        self.now += Duration::seconds(i64::from(rng.random_range(0..=self.max_gap_secs)));
        if rng.random_bool(self.malformed_ratio) {
            return generate_malformed(rng, self.now);
        }
        if rng.random_bool(SCAN_RATE) {
            return generate_scan(rng, self.now);
        }
        generate_access_log(rng, self.now)
    }
}

pub fn generate_access_log<R: Rng + ?Sized>(rng: &mut R, at: NaiveDateTime) -> String {
    let ip = format!(
        "192.168.{}.{}",
        rng.random_range(0..256),
        rng.random_range(1..255)
    );
    let timestamp = at.format(TIMESTAMP_FORMAT);
    let path = PATHS.choose_weighted(rng, |(_, w)| *w).unwrap().0;
    let status = STATUS.choose_weighted(rng, |(_, w)| *w).unwrap().0;
    let agent = AGENTS.choose_weighted(rng, |(_, w)| *w).unwrap().0;

    format!("{ip},{timestamp},{path},{status},{agent}")
}

pub fn generate_scan<R: Rng + ?Sized>(rng: &mut R, at: NaiveDateTime) -> String {
    let ip = SCANNERS.choose(rng).unwrap();
    let timestamp = at.format(TIMESTAMP_FORMAT);
    let path = ["/admin", "/wp-login.php", "/.env"].choose(rng).unwrap();
    let status = if rng.random_bool(0.8) { 404 } else { 500 };

    format!("{ip},{timestamp},{path},{status},sqlmap/1.7")
}

pub fn generate_malformed<R: Rng + ?Sized>(rng: &mut R, at: NaiveDateTime) -> String {
    let timestamp = at.format(TIMESTAMP_FORMAT);
    match rng.random_range(0..4) {
        0 => format!("10.0.0.1,{timestamp},/home"),
        1 => format!("10.0.0.1,{timestamp},/home,OK,Mozilla/5.0"),
        2 => "10.0.0.1,yesterday,/home,200,Mozilla/5.0".to_string(),
        _ => format!("10.0.0.1,{timestamp},,200,Mozilla/5.0"),
    }
}
