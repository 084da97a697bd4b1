use anyhow::{Result, bail};

use pantry_core::Coordinator;

/// Known settings with their store keys and defaults.
const SETTINGS: &[(&str, &str, &str)] = &[
    ("dark-mode", "dark_mode", "false"),
    ("notifications", "notifications_enabled", "true"),
    ("default-servings", "default_servings", "4"),
];

fn lookup(key: &str) -> Result<(&'static str, &'static str)> {
    for (name, store_key, default) in SETTINGS {
        if *name == key {
            return Ok((store_key, default));
        }
    }
    bail!("Unknown setting '{key}'. Known: dark-mode, notifications, default-servings")
}

fn validate(key: &str, value: &str) -> Result<()> {
    match key {
        "dark-mode" | "notifications" => {
            if value != "true" && value != "false" {
                bail!("'{key}' takes true or false");
            }
        }
        "default-servings" => {
            let n: u32 = value
                .parse()
                .map_err(|_| anyhow::anyhow!("'{key}' takes a positive number"))?;
            if n == 0 {
                bail!("'{key}' takes a positive number");
            }
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn cmd_config_get(
    coordinator: &Coordinator,
    key: Option<&str>,
    json: bool,
) -> Result<()> {
    match key {
        Some(key) => {
            let (store_key, default) = lookup(key)?;
            let value = coordinator
                .get_setting(store_key)?
                .unwrap_or_else(|| default.to_string());
            if json {
                println!("{}", serde_json::json!({ "key": key, "value": value }));
            } else {
                println!("{key} = {value}");
            }
        }
        None => {
            let mut all = serde_json::Map::new();
            for (name, store_key, default) in SETTINGS {
                let value = coordinator
                    .get_setting(store_key)?
                    .unwrap_or_else(|| (*default).to_string());
                if json {
                    all.insert((*name).to_string(), serde_json::Value::String(value));
                } else {
                    println!("{name} = {value}");
                }
            }
            if json {
                println!("{}", serde_json::Value::Object(all));
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_config_set(
    coordinator: &Coordinator,
    key: &str,
    value: &str,
    json: bool,
) -> Result<()> {
    let (store_key, _) = lookup(key)?;
    validate(key, value)?;
    coordinator.set_setting(store_key, value)?;
    if json {
        println!("{}", serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{key} = {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_keys() {
        assert!(lookup("dark-mode").is_ok());
        assert!(lookup("notifications").is_ok());
        assert!(lookup("default-servings").is_ok());
        assert!(lookup("nope").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(validate("dark-mode", "true").is_ok());
        assert!(validate("dark-mode", "maybe").is_err());
        assert!(validate("default-servings", "4").is_ok());
        assert!(validate("default-servings", "0").is_err());
        assert!(validate("default-servings", "four").is_err());
    }
}
