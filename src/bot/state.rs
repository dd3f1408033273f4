use serde::Deserialize;
use serde::Serialize;

use crate::order::OrderDraft;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum ConversationState {
  #[default]
  Idle,
  Ordering(OrderDraft),
}
