use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use db::DbErr;
use db::models::event::Event;
use rand::Rng;

/// Keys are what makes collection addresses routable, so they stay short and
/// strictly alphanumeric to survive copy-paste and plus-addressing.
pub const MAX_KEY_LEN: usize = 12;

/// Samples random keys until one is unused in the events table. With 96 bits
/// of entropy per sample the loop terminates on the first pass in practice;
/// the uniqueness check only guards the freak collision.
pub async fn generate_unique_key(pool: &db::DbPool) -> Result<String, DbErr> {
    loop {
        let candidate = sample_key(&mut rand::thread_rng());
        if candidate.is_empty() {
            continue;
        }
        if Event::find_by_key(pool, &candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
}

fn sample_key<R: Rng>(rng: &mut R) -> String {
    let mut raw = [0u8; 12];
    rng.fill(&mut raw);
    URL_SAFE_NO_PAD
        .encode(raw)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_KEY_LEN)
        .collect()
}
