use serde::Deserialize;
use serde::Serialize;
use teloxide::types::MessageId;

/// Position in the ordering state machine. Variants are numbered the way the
/// shop talks about them: 1 category, 2 black list, 3 milk list, 4 volume,
/// 5 tea list, 6 alt milk, 7 syrup, 8 payment gate, 9 awaiting online
/// payment, 10 finalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  #[default]
  Category,
  BlackCoffee,
  MilkCoffee,
  Volume,
  Tea,
  AltMilk,
  Syrup,
  Payment,
  AwaitingOnline,
  Done,
}

impl Step {
  /// Free-text messages become order comments while a drink is being built.
  pub fn accepts_comments(self) -> bool {
    matches!(
      self,
      Step::BlackCoffee | Step::MilkCoffee | Step::Volume | Step::Tea | Step::AltMilk | Step::Syrup | Step::Payment
    )
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  Cash,
  Online,
}

impl PaymentMethod {
  pub fn label(self) -> &'static str {
    match self {
      PaymentMethod::Cash => "💵 Оплата на кассе",
      PaymentMethod::Online => "💳 Оплачено онлайн",
    }
  }
}

/// One finished drink inside a (possibly multi-drink) order. Immutable once
/// appended to the draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLineItem {
  pub item_id: String,
  pub volume: Option<String>,
  pub milk: Option<String>,
  pub syrup: Option<String>,
  pub additions: Vec<String>,
  pub price: i64,
}

/// The order under construction for one conversation. Mutated only by the
/// transition engine; rendered into a single chat message identified by
/// `message_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderDraft {
  pub step: Step,
  pub category_name: Option<String>,
  pub item_id: Option<String>,
  pub volume: Option<String>,
  pub milk: Option<String>,
  pub syrup: Option<String>,
  /// Price of the in-progress drink only.
  pub running_price: i64,
  /// Display labels for milk/syrup of the in-progress drink. Reverted
  /// together with `running_price` on back-navigation.
  pub additions: Vec<String>,
  pub line_items: Vec<OrderLineItem>,
  pub comments: Vec<String>,
  pub payment_method: Option<PaymentMethod>,
  pub payment_id: Option<String>,
  pub payment_url: Option<String>,
  pub order_number: Option<u32>,
  pub message_id: Option<MessageId>,
}

impl OrderDraft {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn total_price(&self) -> i64 {
    self.running_price + self.line_items.iter().map(|line| line.price).sum::<i64>()
  }

  pub fn is_empty(&self) -> bool {
    self.item_id.is_none() && self.line_items.is_empty()
  }

  /// Moves the in-progress drink into `line_items` and clears every
  /// in-progress field. No-op when no drink is being built.
  pub fn commit_in_progress(&mut self) {
    let Some(item_id) = self.item_id.take() else {
      return;
    };
    self.line_items.push(OrderLineItem {
      item_id,
      volume: self.volume.take(),
      milk: self.milk.take(),
      syrup: self.syrup.take(),
      additions: std::mem::take(&mut self.additions),
      price: self.running_price,
    });
    self.running_price = 0;
    self.category_name = None;
  }

  /// Assigns the daily order number exactly once; duplicate terminal
  /// triggers must not draw a second number.
  pub fn assign_order_number(&mut self, number: u32) -> bool {
    if self.order_number.is_some() {
      return false;
    }
    self.order_number = Some(number);
    true
  }
}

#[cfg(test)]
mod tests {
  use super::OrderDraft;
  use super::OrderLineItem;
  use super::Step;

  fn line(price: i64) -> OrderLineItem {
    OrderLineItem {
      item_id: "americano".to_string(),
      volume: Some("0.3".to_string()),
      milk: None,
      syrup: None,
      additions: Vec::new(),
      price,
    }
  }

  #[test]
  fn total_is_running_plus_lines() {
    let mut draft = OrderDraft::new();
    assert_eq!(draft.total_price(), 0);
    draft.running_price = 240;
    draft.line_items.push(line(200));
    draft.line_items.push(line(150));
    assert_eq!(draft.total_price(), 590);
  }

  #[test]
  fn empty_until_item_or_line_exists() {
    let mut draft = OrderDraft::new();
    assert!(draft.is_empty());
    draft.item_id = Some("latte".to_string());
    assert!(!draft.is_empty());
    draft.item_id = None;
    draft.line_items.push(line(250));
    assert!(!draft.is_empty());
  }

  #[test]
  fn commit_moves_in_progress_fields() {
    let mut draft = OrderDraft::new();
    draft.step = Step::Payment;
    draft.item_id = Some("cappuccino".to_string());
    draft.volume = Some("0.3".to_string());
    draft.milk = Some("oat".to_string());
    draft.additions = vec!["Молоко Овсяное".to_string()];
    draft.running_price = 300;

    draft.commit_in_progress();

    assert!(draft.item_id.is_none());
    assert!(draft.volume.is_none());
    assert!(draft.milk.is_none());
    assert!(draft.additions.is_empty());
    assert_eq!(draft.running_price, 0);
    assert_eq!(draft.line_items.len(), 1);
    let committed = &draft.line_items[0];
    assert_eq!(committed.price, 300);
    assert_eq!(committed.additions, vec!["Молоко Овсяное".to_string()]);
    assert_eq!(draft.total_price(), 300);
  }

  #[test]
  fn commit_without_item_is_a_noop() {
    let mut draft = OrderDraft::new();
    draft.commit_in_progress();
    assert!(draft.line_items.is_empty());
  }

  #[test]
  fn order_number_assigned_once() {
    let mut draft = OrderDraft::new();
    assert!(draft.assign_order_number(7));
    assert!(!draft.assign_order_number(8));
    assert_eq!(draft.order_number, Some(7));
  }
}
