use std::env;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;

#[derive(Debug, Clone)]
pub struct Config {
  pub bot_token: String,
  pub staff_group_id: i64,
  pub store_path: PathBuf,
  pub yookassa: Option<YooKassaConfig>,
}

#[derive(Debug, Clone)]
pub struct YooKassaConfig {
  pub shop_id: String,
  pub secret_key: String,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    let bot_token = env::var("BOT_TOKEN")
      .or_else(|_| env::var("TELOXIDE_TOKEN"))
      .context("BOT_TOKEN or TELOXIDE_TOKEN must be set")?;
    let staff_group_id = env::var("STAFF_GROUP_ID")
      .context("STAFF_GROUP_ID must be set")?
      .trim()
      .parse::<i64>()
      .context("STAFF_GROUP_ID must be a numeric chat id")?;
    let store_path = env::var("STORE_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from("store.json"));
    let yookassa = parse_yookassa(env::var("YOOKASSA_SHOP_ID").ok(), env::var("YOOKASSA_SECRET_KEY").ok())?;
    Ok(Self {
      bot_token,
      staff_group_id,
      store_path,
      yookassa,
    })
  }
}

/// Both credentials or neither; half a credential pair is a deployment
/// mistake, not a cash-only shop.
fn parse_yookassa(shop_id: Option<String>, secret_key: Option<String>) -> Result<Option<YooKassaConfig>> {
  let shop_id = shop_id.filter(|value| !value.trim().is_empty());
  let secret_key = secret_key.filter(|value| !value.trim().is_empty());
  match (shop_id, secret_key) {
    (Some(shop_id), Some(secret_key)) => Ok(Some(YooKassaConfig { shop_id, secret_key })),
    (None, None) => Ok(None),
    _ => bail!("YOOKASSA_SHOP_ID and YOOKASSA_SECRET_KEY must be set together"),
  }
}
