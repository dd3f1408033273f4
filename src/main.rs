mod app;
mod bot;
mod config;
mod engine;
mod menu;
mod order;
mod payments;
mod render;
mod store;
mod telemetry;
mod util;

use anyhow::Result;
use teloxide::prelude::Bot;
use teloxide::types::ChatId;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
  telemetry::init()?;
  let config = config::Config::from_env()?;
  menu::MENU.validate()?;
  info!(online_payment = config.yookassa.is_some(), "starting bot");

  let bot = Bot::new(config.bot_token.clone());
  let store = store::Store::open(&config.store_path).await?;
  let payments = match &config.yookassa {
    Some(credentials) => Some(payments::YooKassa::new(
      credentials.shop_id.clone(),
      credentials.secret_key.clone(),
      payments::return_url_for_token(&config.bot_token),
    )?),
    None => None,
  };
  let app = app::App::new(bot, store, payments, ChatId(config.staff_group_id));
  app.run().await
}
