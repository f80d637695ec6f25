use chrono::NaiveDateTime;
use snowflake::SnowflakeIdGenerator;
use std::sync::Mutex;
use std::time::{Duration, UNIX_EPOCH};

const SNOWFLAKE_EPOCH: u64 = 1767225600000;

static GENERATOR: once_cell::sync::OnceCell<Mutex<SnowflakeIdGenerator>> = once_cell::sync::OnceCell::new();

fn new() -> Mutex<SnowflakeIdGenerator> {
    let epoch = UNIX_EPOCH + Duration::from_millis(SNOWFLAKE_EPOCH);
    let machine_id = fastrand::i32(0..32);
    let node_id = fastrand::i32(0..32);
    Mutex::new(SnowflakeIdGenerator::with_epoch(machine_id, node_id, epoch))
}

// row id for every table owned by the ledger
pub fn next() -> i64 {
    let mut generator = match GENERATOR.get_or_init(new).lock() {
        Ok(generator) => generator,
        Err(poisoned) => poisoned.into_inner(),
    };
    generator.generate()
}

// gateway-facing transaction id: TXN + timestamp + 8 uppercase hex chars
pub fn next_transaction_id(now: NaiveDateTime) -> String {
    format!("TXN{}{:08X}", now.format("%Y%m%d%H%M%S"), fastrand::u32(..))
}
