use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use std::str::FromStr;

const MAX_ASSET_ID_LEN: usize = 128;

// Validate a CoinGecko asset identifier such as "bitcoin" or "usd-coin"
pub fn validate_asset_id(asset_id: &str) -> bool {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^[a-z0-9][a-z0-9._-]*$").unwrap();
    }

    asset_id.len() <= MAX_ASSET_ID_LEN && RE.is_match(asset_id)
}

// Parse a comma separated list of asset ids, dropping blanks, invalid ids and duplicates
pub fn parse_id_list(input: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();

    for raw in input.split(',') {
        let id = raw.trim().to_lowercase();
        if id.is_empty() {
            continue;
        }
        if !validate_asset_id(&id) {
            warn!("Ignoring invalid asset id in list: {}", raw);
            continue;
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    ids
}

// Read an environment variable, falling back to `default` when unset or unparsable
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Invalid value for {}: {:?}, using default", key, value);
                default
            }
        },
        Err(_) => default,
    }
}

// Split a comma separated setting into trimmed, non-empty entries
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
