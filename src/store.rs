//! The settings and daily-counter store: one JSON document on disk, all
//! access serialized behind a mutex so counter increments never race.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;
use tracing::warn;

use crate::util::moscow_today;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
  pub bot_active: bool,
  pub online_payment_enabled: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      bot_active: true,
      online_payment_enabled: true,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
struct StoreData {
  last_reset_date: Option<NaiveDate>,
  current_id: u32,
  settings: Settings,
}

#[derive(Clone)]
pub struct Store {
  inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
  path: PathBuf,
  data: StoreData,
}

impl Store {
  /// A missing or unreadable document starts fresh with defaults, matching
  /// a first boot.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    let data = match tokio::fs::read(&path).await {
      Ok(bytes) => match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(err) => {
          warn!(path = %path.display(), error = %err, "store file unreadable, starting fresh");
          StoreData::default()
        },
      },
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
      Err(err) => return Err(err).context("failed to read store file"),
    };
    Ok(Self {
      inner: Arc::new(Mutex::new(StoreInner { path, data })),
    })
  }

  pub async fn settings(&self) -> Settings {
    self.inner.lock().await.data.settings.clone()
  }

  #[allow(dead_code)]
  #[instrument(skip(self, apply))]
  pub async fn update_settings(&self, apply: impl FnOnce(&mut Settings)) -> Result<Settings> {
    let mut inner = self.inner.lock().await;
    apply(&mut inner.data.settings);
    inner.persist().await?;
    Ok(inner.data.settings.clone())
  }

  /// Next sequential order number; restarts from 1 on the first call after
  /// Moscow midnight.
  #[instrument(skip(self))]
  pub async fn next_daily_order_number(&self) -> Result<u32> {
    let mut inner = self.inner.lock().await;
    let number = bump(&mut inner.data, moscow_today(Utc::now()));
    inner.persist().await?;
    Ok(number)
  }
}

impl StoreInner {
  async fn persist(&self) -> Result<()> {
    let json = serde_json::to_vec_pretty(&self.data).context("failed to encode store file")?;
    tokio::fs::write(&self.path, json).await.context("failed to write store file")
  }
}

fn bump(data: &mut StoreData, today: NaiveDate) -> u32 {
  if data.last_reset_date != Some(today) {
    data.last_reset_date = Some(today);
    data.current_id = 1;
  } else {
    data.current_id += 1;
  }
  data.current_id
}
