//! YooKassa client: create a payment for the order total and poll its
//! status. Both calls are bounded by the client timeout; failures surface as
//! transient messages and never move the draft.

use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::instrument;

const API_BASE: &str = "https://api.yookassa.ru/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct YooKassa {
  client: Client,
  shop_id: String,
  secret_key: String,
  return_url: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Pending,
  WaitingForCapture,
  Succeeded,
  Canceled,
}

#[derive(Debug, Clone)]
pub struct CreatedPayment {
  pub id: String,
  pub confirmation_url: String,
}

#[derive(Serialize)]
struct Amount {
  value: String,
  currency: &'static str,
}

#[derive(Serialize)]
struct ConfirmationRequest<'a> {
  #[serde(rename = "type")]
  kind: &'static str,
  return_url: &'a str,
}

#[derive(Serialize)]
struct CreatePaymentBody<'a> {
  amount: Amount,
  capture: bool,
  confirmation: ConfirmationRequest<'a>,
  description: &'a str,
}

#[derive(Deserialize)]
struct PaymentResponse {
  id: String,
  status: PaymentStatus,
  confirmation: Option<ConfirmationResponse>,
}

#[derive(Deserialize)]
struct ConfirmationResponse {
  confirmation_url: Option<String>,
}

impl YooKassa {
  pub fn new(shop_id: String, secret_key: String, return_url: String) -> Result<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .context("failed to build http client")?;
    Ok(Self {
      client,
      shop_id,
      secret_key,
      return_url,
    })
  }

  #[instrument(skip(self, description, idempotence_key))]
  pub async fn create_payment(&self, amount: i64, description: &str, idempotence_key: &str) -> Result<CreatedPayment> {
    let body = CreatePaymentBody {
      amount: Amount {
        value: format!("{amount}.00"),
        currency: "RUB",
      },
      capture: true,
      confirmation: ConfirmationRequest {
        kind: "redirect",
        return_url: &self.return_url,
      },
      description,
    };

    let response = self
      .client
      .post(format!("{API_BASE}/payments"))
      .basic_auth(&self.shop_id, Some(&self.secret_key))
      .header("Idempotence-Key", idempotence_key)
      .json(&body)
      .send()
      .await
      .context("payment creation request failed")?
      .error_for_status()
      .context("payment creation rejected")?
      .json::<PaymentResponse>()
      .await
      .context("failed to decode payment response")?;

    let confirmation_url = response
      .confirmation
      .and_then(|confirmation| confirmation.confirmation_url)
      .context("payment response missing confirmation url")?;

    info!(payment_id = %response.id, amount, "created payment");
    Ok(CreatedPayment {
      id: response.id,
      confirmation_url,
    })
  }

  #[instrument(skip(self))]
  pub async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus> {
    let response = self
      .client
      .get(format!("{API_BASE}/payments/{payment_id}"))
      .basic_auth(&self.shop_id, Some(&self.secret_key))
      .send()
      .await
      .context("payment status request failed")?
      .error_for_status()
      .context("payment status rejected")?
      .json::<PaymentResponse>()
      .await
      .context("failed to decode payment response")?;

    info!(payment_id = %response.id, status = ?response.status, "fetched payment status");
    Ok(response.status)
  }
}

/// YooKassa redirects back to the bot after checkout.
pub fn return_url_for_token(bot_token: &str) -> String {
  let bot_id = bot_token.split(':').next().unwrap_or_default();
  format!("https://t.me/{bot_id}")
}

#[cfg(test)]
mod tests {
  use super::PaymentStatus;
  use super::return_url_for_token;

  #[test]
  fn statuses_decode_from_wire_names() {
    let decode = |raw: &str| serde_json::from_str::<PaymentStatus>(raw).expect("valid status");
    assert_eq!(decode("\"pending\""), PaymentStatus::Pending);
    assert_eq!(decode("\"waiting_for_capture\""), PaymentStatus::WaitingForCapture);
    assert_eq!(decode("\"succeeded\""), PaymentStatus::Succeeded);
    assert_eq!(decode("\"canceled\""), PaymentStatus::Canceled);
  }

  #[test]
  fn return_url_points_at_the_bot() {
    assert_eq!(return_url_for_token("12345:abcdef"), "https://t.me/12345");
  }
}
