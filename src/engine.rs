//! The order state machine. Forward routing depends on the picked item's
//! category and pricing variant; every `back` re-derives the same branch from
//! the still-present selections and undoes exactly the fields and price
//! deltas the forward transition applied.

use crate::menu::Addition;
use crate::menu::AdditionKind;
use crate::menu::Category;
use crate::menu::Menu;
use crate::menu::Pricing;
use crate::order::OrderDraft;
use crate::order::PaymentMethod;
use crate::order::Step;
use crate::payments::PaymentStatus;

pub const STALE_ACTION: &str = "Что-то пошло не так. Попробуйте ещё раз.";
pub const EMPTY_ORDER: &str = "Заказ пуст. Сначала выберите напиток.";
pub const NO_PAYMENT: &str = "Ошибка: платеж не был создан.";
pub const PAYMENT_PENDING: &str = "Оплата ещё в процессе. Завершите оплату и нажмите «Я оплатил» снова.";
pub const PAYMENT_FAILED: &str = "Оплата не найдена или отклонена. Попробуйте снова или оплатите на кассе.";

/// A user action decoded from callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  PickCategory(Category),
  PickItem(String),
  PickVolume(String),
  /// `None` means "thanks, no milk".
  PickMilk(Option<String>),
  PickSyrup(Option<String>),
  Back,
  AddAnother,
  PayCash,
  PayOnline,
  ConfirmPayment,
}

impl Action {
  /// Callback data uses `prefix:value`. Unknown data yields `None` and is
  /// answered with a plain acknowledgment.
  pub fn parse(data: &str) -> Option<Action> {
    let (prefix, value) = data.split_once(':')?;
    match prefix {
      "cat" => match value {
        "black" => Some(Action::PickCategory(Category::BlackCoffee)),
        "milk" => Some(Action::PickCategory(Category::MilkCoffee)),
        "tea" => Some(Action::PickCategory(Category::Tea)),
        _ => None,
      },
      "item" => Some(Action::PickItem(value.to_string())),
      "vol" => Some(Action::PickVolume(value.to_string())),
      "milk" => Some(Action::PickMilk((value != "none").then(|| value.to_string()))),
      "syrup" => Some(Action::PickSyrup((value != "none").then(|| value.to_string()))),
      "order" => match value {
        "back" => Some(Action::Back),
        "more" => Some(Action::AddAnother),
        _ => None,
      },
      "pay" => match value {
        "cash" => Some(Action::PayCash),
        "online" => Some(Action::PayOnline),
        "check" => Some(Action::ConfirmPayment),
        _ => None,
      },
      _ => None,
    }
  }
}

/// What the handler must do after the engine has looked at an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
  /// Draft changed, re-render the order message.
  Render,
  /// Draft unchanged. Create a payment for `amount`, then call
  /// [`attach_payment`] on success.
  StartOnlinePayment { amount: i64 },
  /// Draft unchanged. Poll the gateway, then call [`apply_payment_status`].
  CheckPayment { payment_id: String },
  /// Draft reached the terminal step; finalize exactly once.
  Finalize,
  /// Draft unchanged; show a toast to the user.
  Rejected(&'static str),
  /// Action is not legal for the current step; drop it silently.
  Ignored,
}

pub fn apply(draft: &mut OrderDraft, action: &Action, menu: &Menu) -> Advance {
  if matches!(action, Action::Back) {
    return back(draft, menu);
  }
  match draft.step {
    Step::Category => match action {
      Action::PickCategory(category) => pick_category(draft, *category),
      _ => Advance::Ignored,
    },
    Step::BlackCoffee | Step::MilkCoffee | Step::Tea => match action {
      Action::PickItem(id) => pick_item(draft, id, menu),
      _ => Advance::Ignored,
    },
    Step::Volume => match action {
      Action::PickVolume(volume) => pick_volume(draft, volume, menu),
      _ => Advance::Ignored,
    },
    Step::AltMilk => match action {
      Action::PickMilk(choice) => pick_milk(draft, choice.as_deref(), menu),
      _ => Advance::Ignored,
    },
    Step::Syrup => match action {
      Action::PickSyrup(choice) => pick_syrup(draft, choice.as_deref(), menu),
      _ => Advance::Ignored,
    },
    Step::Payment => match action {
      Action::AddAnother => add_another(draft),
      Action::PayCash => pay_cash(draft),
      Action::PayOnline => pay_online(draft),
      _ => Advance::Ignored,
    },
    Step::AwaitingOnline => match action {
      Action::ConfirmPayment => match &draft.payment_id {
        Some(payment_id) => Advance::CheckPayment { payment_id: payment_id.clone() },
        None => Advance::Rejected(NO_PAYMENT),
      },
      _ => Advance::Ignored,
    },
    Step::Done => Advance::Ignored,
  }
}

/// Online payment succeeded to create: commit the in-progress drink, record
/// the linkage and move to the confirmation step. Counterpart of
/// [`Advance::StartOnlinePayment`]; never called on failure, so a failed
/// creation leaves the draft untouched at the payment step.
pub fn attach_payment(draft: &mut OrderDraft, payment_id: String, payment_url: String) {
  draft.commit_in_progress();
  draft.payment_method = Some(PaymentMethod::Online);
  draft.payment_id = Some(payment_id);
  draft.payment_url = Some(payment_url);
  draft.step = Step::AwaitingOnline;
}

/// Outcome of a payment-status poll. Only `Succeeded` moves the draft.
pub fn apply_payment_status(draft: &mut OrderDraft, status: PaymentStatus) -> Advance {
  match status {
    PaymentStatus::Succeeded => {
      draft.step = Step::Done;
      Advance::Finalize
    },
    PaymentStatus::Pending | PaymentStatus::WaitingForCapture => Advance::Rejected(PAYMENT_PENDING),
    PaymentStatus::Canceled => Advance::Rejected(PAYMENT_FAILED),
  }
}

fn pick_category(draft: &mut OrderDraft, category: Category) -> Advance {
  let step = match category {
    Category::BlackCoffee => Step::BlackCoffee,
    Category::MilkCoffee => Step::MilkCoffee,
    Category::Tea => Step::Tea,
    _ => return Advance::Rejected(STALE_ACTION),
  };
  draft.step = step;
  draft.category_name = Some(category.title().to_string());
  Advance::Render
}

fn expected_category(step: Step) -> Option<Category> {
  match step {
    Step::BlackCoffee => Some(Category::BlackCoffee),
    Step::MilkCoffee => Some(Category::MilkCoffee),
    Step::Tea => Some(Category::Tea),
    _ => None,
  }
}

fn pick_item(draft: &mut OrderDraft, id: &str, menu: &Menu) -> Advance {
  let Some(item) = menu.find_item(id) else {
    return Advance::Rejected(STALE_ACTION);
  };
  if expected_category(draft.step) != Some(item.category) {
    return Advance::Rejected(STALE_ACTION);
  }

  draft.item_id = Some(item.id.to_string());
  draft.category_name = None;
  match (item.category, &item.pricing) {
    // Tea is served in its standard (first) volume and goes straight to
    // the payment gate.
    (Category::Tea, Pricing::ByVolume(table)) => {
      let (volume, price) = table[0];
      draft.volume = Some(volume.to_string());
      draft.running_price = price;
      draft.step = Step::Payment;
    },
    (_, Pricing::Fixed { volume, price }) => {
      draft.volume = Some(volume.to_string());
      draft.running_price = *price;
      draft.step = Step::Payment;
    },
    (_, Pricing::ByVolume(_)) => {
      draft.step = Step::Volume;
    },
  }
  Advance::Render
}

fn pick_volume(draft: &mut OrderDraft, volume: &str, menu: &Menu) -> Advance {
  let Some(item) = draft.item_id.as_deref().and_then(|id| menu.find_item(id)) else {
    return Advance::Rejected(STALE_ACTION);
  };
  let Some(price) = item.price_for(volume) else {
    return Advance::Rejected(STALE_ACTION);
  };
  draft.volume = Some(volume.to_string());
  draft.running_price = price;
  draft.step = if item.category == Category::MilkCoffee {
    Step::AltMilk
  } else {
    Step::Payment
  };
  Advance::Render
}

fn milk_label(addition: &Addition) -> String {
  format!("Молоко {}", addition.name)
}

fn syrup_label(addition: &Addition) -> String {
  format!("Сироп {}", addition.name)
}

fn pick_milk(draft: &mut OrderDraft, choice: Option<&str>, menu: &Menu) -> Advance {
  if let Some(id) = choice {
    let Some(addition) = menu.find_addition(AdditionKind::Milk, id) else {
      return Advance::Rejected(STALE_ACTION);
    };
    draft.milk = Some(addition.id.to_string());
    draft.running_price += addition.surcharge;
    draft.additions.push(milk_label(addition));
  }
  draft.step = Step::Syrup;
  Advance::Render
}

fn pick_syrup(draft: &mut OrderDraft, choice: Option<&str>, menu: &Menu) -> Advance {
  if let Some(id) = choice {
    let Some(addition) = menu.find_addition(AdditionKind::Syrup, id) else {
      return Advance::Rejected(STALE_ACTION);
    };
    draft.syrup = Some(addition.id.to_string());
    draft.running_price += addition.surcharge;
    draft.additions.push(syrup_label(addition));
  }
  draft.step = Step::Payment;
  Advance::Render
}

fn add_another(draft: &mut OrderDraft) -> Advance {
  draft.commit_in_progress();
  draft.step = Step::Category;
  Advance::Render
}

fn pay_cash(draft: &mut OrderDraft) -> Advance {
  draft.commit_in_progress();
  draft.payment_method = Some(PaymentMethod::Cash);
  draft.step = Step::Done;
  Advance::Finalize
}

fn pay_online(draft: &mut OrderDraft) -> Advance {
  let amount = draft.total_price();
  if amount == 0 {
    return Advance::Rejected(EMPTY_ORDER);
  }
  Advance::StartOnlinePayment { amount }
}

fn back(draft: &mut OrderDraft, menu: &Menu) -> Advance {
  match draft.step {
    Step::Category | Step::Done => Advance::Ignored,
    Step::BlackCoffee | Step::MilkCoffee | Step::Tea => {
      draft.step = Step::Category;
      draft.category_name = None;
      Advance::Render
    },
    Step::Volume => {
      let target = match draft.item_id.as_deref().and_then(|id| menu.find_item(id)) {
        Some(item) if item.category == Category::BlackCoffee => Step::BlackCoffee,
        Some(item) if item.category == Category::MilkCoffee => Step::MilkCoffee,
        _ => Step::Category,
      };
      draft.item_id = None;
      draft.running_price = 0;
      draft.category_name = expected_category(target).map(|category| category.title().to_string());
      draft.step = target;
      Advance::Render
    },
    Step::AltMilk => {
      draft.step = Step::Volume;
      draft.volume = None;
      draft.running_price = 0;
      Advance::Render
    },
    Step::Syrup => {
      draft.step = Step::AltMilk;
      if let Some(milk_id) = draft.milk.take()
        && let Some(addition) = menu.find_addition(AdditionKind::Milk, &milk_id)
      {
        draft.running_price -= addition.surcharge;
        let label = milk_label(addition);
        draft.additions.retain(|existing| existing != &label);
      }
      Advance::Render
    },
    Step::Payment => back_from_payment(draft, menu),
    Step::AwaitingOnline => {
      draft.step = Step::Payment;
      draft.payment_method = None;
      draft.payment_id = None;
      draft.payment_url = None;
      Advance::Render
    },
  }
}

/// Mirrors the forward branch that reached the payment gate, dispatching on
/// the in-progress item. A blind "step minus one" would be wrong here.
fn back_from_payment(draft: &mut OrderDraft, menu: &Menu) -> Advance {
  let Some(item_id) = draft.item_id.clone() else {
    // The drink was already committed (backing out of the confirmation
    // step); there is nothing to undo.
    draft.step = Step::Category;
    return Advance::Render;
  };
  let Some(item) = menu.find_item(&item_id) else {
    return Advance::Rejected(STALE_ACTION);
  };

  match (item.category, &item.pricing) {
    (Category::Tea, _) => {
      draft.step = Step::Tea;
      draft.item_id = None;
      draft.volume = None;
      draft.running_price = 0;
      draft.category_name = Some(Category::Tea.title().to_string());
    },
    (Category::BlackCoffee, Pricing::Fixed { .. }) => {
      draft.step = Step::BlackCoffee;
      draft.item_id = None;
      draft.volume = None;
      draft.running_price = 0;
      draft.category_name = Some(Category::BlackCoffee.title().to_string());
    },
    (Category::BlackCoffee, Pricing::ByVolume(_)) => {
      draft.step = Step::Volume;
      draft.volume = None;
      draft.running_price = 0;
    },
    (Category::MilkCoffee, _) => {
      draft.step = Step::Syrup;
      if let Some(syrup_id) = draft.syrup.take()
        && let Some(addition) = menu.find_addition(AdditionKind::Syrup, &syrup_id)
      {
        draft.running_price -= addition.surcharge;
        let label = syrup_label(addition);
        draft.additions.retain(|existing| existing != &label);
      }
    },
    _ => {
      // Unreachable with the shipped catalog: only the three orderable
      // categories can put a draft on the payment step.
      draft.step = Step::Category;
      draft.item_id = None;
      draft.volume = None;
      draft.running_price = 0;
      draft.category_name = None;
    },
  }
  Advance::Render
}

#[cfg(test)]
mod tests {
  use super::Action;
  use super::Advance;
  use super::apply;
  use super::apply_payment_status;
  use super::attach_payment;
  use crate::menu::Category;
  use crate::menu::MENU;
  use crate::order::OrderDraft;
  use crate::order::PaymentMethod;
  use crate::order::Step;
  use crate::payments::PaymentStatus;

  fn advance(draft: &mut OrderDraft, action: Action) -> Advance {
    apply(draft, &action, &MENU)
  }

  fn pick(draft: &mut OrderDraft, data: &str) -> Advance {
    let action = Action::parse(data).expect("valid callback data");
    apply(draft, &action, &MENU)
  }

  #[test]
  fn parses_callback_data() {
    assert_eq!(Action::parse("cat:black"), Some(Action::PickCategory(Category::BlackCoffee)));
    assert_eq!(Action::parse("item:latte"), Some(Action::PickItem("latte".to_string())));
    assert_eq!(Action::parse("vol:0.3"), Some(Action::PickVolume("0.3".to_string())));
    assert_eq!(Action::parse("milk:none"), Some(Action::PickMilk(None)));
    assert_eq!(Action::parse("syrup:vanilla"), Some(Action::PickSyrup(Some("vanilla".to_string()))));
    assert_eq!(Action::parse("order:back"), Some(Action::Back));
    assert_eq!(Action::parse("order:more"), Some(Action::AddAnother));
    assert_eq!(Action::parse("pay:cash"), Some(Action::PayCash));
    assert_eq!(Action::parse("pay:check"), Some(Action::ConfirmPayment));
    assert_eq!(Action::parse("nonsense"), None);
    assert_eq!(Action::parse("cat:unknown"), None);
  }

  #[test]
  fn americano_routes_through_volume() {
    let mut draft = OrderDraft::new();
    assert_eq!(pick(&mut draft, "cat:black"), Advance::Render);
    assert_eq!(draft.step, Step::BlackCoffee);
    assert_eq!(draft.category_name.as_deref(), Some("Черный кофе"));

    assert_eq!(pick(&mut draft, "item:americano"), Advance::Render);
    assert_eq!(draft.step, Step::Volume);
    assert!(draft.category_name.is_none());

    assert_eq!(pick(&mut draft, "vol:0.3"), Advance::Render);
    assert_eq!(draft.step, Step::Payment);
    assert_eq!(draft.running_price, 200);

    // back from the payment gate keeps the item but drops the volume
    assert_eq!(pick(&mut draft, "order:back"), Advance::Render);
    assert_eq!(draft.step, Step::Volume);
    assert_eq!(draft.running_price, 0);
    assert!(draft.volume.is_none());
    assert_eq!(draft.item_id.as_deref(), Some("americano"));
  }

  #[test]
  fn espresso_skips_volume_and_back_undoes_the_jump() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    let before = draft.clone();

    assert_eq!(pick(&mut draft, "item:espresso"), Advance::Render);
    assert_eq!(draft.step, Step::Payment);
    assert_eq!(draft.volume.as_deref(), Some("0.042"));
    assert_eq!(draft.running_price, 150);

    assert_eq!(pick(&mut draft, "order:back"), Advance::Render);
    assert_eq!(draft, before);
  }

  #[test]
  fn tea_jumps_to_payment_with_standard_serving() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:tea");
    let before = draft.clone();

    assert_eq!(pick(&mut draft, "item:tea_mint"), Advance::Render);
    assert_eq!(draft.step, Step::Payment);
    assert_eq!(draft.volume.as_deref(), Some("0.3"));
    assert_eq!(draft.running_price, 180);

    assert_eq!(pick(&mut draft, "order:back"), Advance::Render);
    assert_eq!(draft, before);
  }

  #[test]
  fn cappuccino_walks_the_full_milk_path() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:milk");
    pick(&mut draft, "item:cappuccino");
    assert_eq!(draft.step, Step::Volume);

    pick(&mut draft, "vol:0.3");
    assert_eq!(draft.step, Step::AltMilk);
    assert_eq!(draft.running_price, 240);

    pick(&mut draft, "milk:oat");
    assert_eq!(draft.step, Step::Syrup);
    assert_eq!(draft.running_price, 300);
    assert_eq!(draft.additions, vec!["Молоко Овсяное".to_string()]);

    pick(&mut draft, "syrup:none");
    assert_eq!(draft.step, Step::Payment);
    assert_eq!(draft.running_price, 300);

    // back: syrup step (nothing to refund), milk step, volume step
    pick(&mut draft, "order:back");
    assert_eq!(draft.step, Step::Syrup);
    assert_eq!(draft.running_price, 300);

    pick(&mut draft, "order:back");
    assert_eq!(draft.step, Step::AltMilk);
    assert_eq!(draft.running_price, 240);
    assert!(draft.milk.is_none());
    assert!(draft.additions.is_empty());

    pick(&mut draft, "order:back");
    assert_eq!(draft.step, Step::Volume);
    assert_eq!(draft.running_price, 0);
    assert!(draft.volume.is_none());
  }

  #[test]
  fn every_forward_transition_has_an_exact_inverse() {
    // (path to reach a state, one more action, expected step after it)
    let cases: &[(&[&str], &str, Step)] = &[
      (&[], "cat:black", Step::BlackCoffee),
      (&[], "cat:milk", Step::MilkCoffee),
      (&[], "cat:tea", Step::Tea),
      (&["cat:black"], "item:americano", Step::Volume),
      (&["cat:black"], "item:espresso", Step::Payment),
      (&["cat:black"], "item:espresso_tonic", Step::Payment),
      (&["cat:black"], "item:bumble", Step::Payment),
      (&["cat:tea"], "item:tea_black", Step::Payment),
      (&["cat:milk"], "item:raf", Step::Volume),
      (&["cat:black", "item:americano"], "vol:0.2", Step::Payment),
      (&["cat:milk", "item:cappuccino"], "vol:0.4", Step::AltMilk),
      (&["cat:milk", "item:cappuccino", "vol:0.3"], "milk:almond", Step::Syrup),
      (&["cat:milk", "item:cappuccino", "vol:0.3"], "milk:none", Step::Syrup),
      (&["cat:milk", "item:cappuccino", "vol:0.3", "milk:oat"], "syrup:vanilla", Step::Payment),
      (&["cat:milk", "item:latte", "vol:0.3", "milk:none"], "syrup:none", Step::Payment),
    ];

    for (path, forward, expected) in cases {
      let mut draft = OrderDraft::new();
      for data in *path {
        assert_eq!(pick(&mut draft, data), Advance::Render, "setup {data}");
      }
      let before = draft.clone();
      assert_eq!(pick(&mut draft, forward), Advance::Render, "forward {forward}");
      assert_eq!(draft.step, *expected, "forward {forward}");
      assert_eq!(pick(&mut draft, "order:back"), Advance::Render, "back after {forward}");
      assert_eq!(draft, before, "inverse of {forward}");
    }
  }

  #[test]
  fn illegal_actions_never_touch_the_draft() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    let before = draft.clone();

    // volume callback at the item-list step
    assert_eq!(pick(&mut draft, "vol:0.3"), Advance::Ignored);
    assert_eq!(draft, before);
    // payment callback mid-customization
    assert_eq!(advance(&mut draft, Action::PayCash), Advance::Ignored);
    assert_eq!(draft, before);
    // item from another category (stale keyboard)
    assert!(matches!(pick(&mut draft, "item:cappuccino"), Advance::Rejected(_)));
    assert_eq!(draft, before);
    // unknown item id
    assert!(matches!(pick(&mut draft, "item:missing"), Advance::Rejected(_)));
    assert_eq!(draft, before);
  }

  #[test]
  fn unpriced_volume_is_rejected() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:milk");
    pick(&mut draft, "item:latte");
    let before = draft.clone();
    assert!(matches!(pick(&mut draft, "vol:0.2"), Advance::Rejected(_)));
    assert_eq!(draft, before);
  }

  #[test]
  fn back_at_the_edges_is_ignored() {
    let mut draft = OrderDraft::new();
    assert_eq!(pick(&mut draft, "order:back"), Advance::Ignored);
    draft.step = Step::Done;
    assert_eq!(pick(&mut draft, "order:back"), Advance::Ignored);
  }

  #[test]
  fn add_another_commits_and_restarts() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:espresso");
    assert_eq!(pick(&mut draft, "order:more"), Advance::Render);

    assert_eq!(draft.step, Step::Category);
    assert!(draft.item_id.is_none());
    assert_eq!(draft.running_price, 0);
    assert_eq!(draft.line_items.len(), 1);
    assert_eq!(draft.line_items[0].price, 150);
    assert_eq!(draft.total_price(), 150);
  }

  #[test]
  fn cash_payment_commits_and_finalizes() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:tea");
    pick(&mut draft, "item:tea_black");
    assert_eq!(advance(&mut draft, Action::PayCash), Advance::Finalize);

    assert_eq!(draft.step, Step::Done);
    assert_eq!(draft.payment_method, Some(PaymentMethod::Cash));
    assert!(draft.item_id.is_none());
    assert_eq!(draft.line_items.len(), 1);
    assert_eq!(draft.total_price(), 180);
  }

  #[test]
  fn online_payment_amount_covers_all_drinks() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:espresso");
    pick(&mut draft, "order:more");
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:americano");
    pick(&mut draft, "vol:0.3");

    let before = draft.clone();
    assert_eq!(advance(&mut draft, Action::PayOnline), Advance::StartOnlinePayment { amount: 350 });
    // creation may still fail; the engine must not have moved anything yet
    assert_eq!(draft, before);
  }

  #[test]
  fn online_payment_on_empty_order_is_rejected() {
    let mut draft = OrderDraft::new();
    draft.step = Step::Payment;
    assert!(matches!(advance(&mut draft, Action::PayOnline), Advance::Rejected(_)));
  }

  #[test]
  fn attach_payment_commits_and_awaits_confirmation() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:espresso");

    attach_payment(&mut draft, "pay-1".to_string(), "https://pay.example/1".to_string());
    assert_eq!(draft.step, Step::AwaitingOnline);
    assert_eq!(draft.payment_method, Some(PaymentMethod::Online));
    assert_eq!(draft.payment_id.as_deref(), Some("pay-1"));
    assert_eq!(draft.payment_url.as_deref(), Some("https://pay.example/1"));
    assert_eq!(draft.line_items.len(), 1);
    assert!(draft.item_id.is_none());
  }

  #[test]
  fn pending_then_succeeded_confirmation() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:espresso");
    attach_payment(&mut draft, "pay-2".to_string(), "https://pay.example/2".to_string());

    assert_eq!(
      advance(&mut draft, Action::ConfirmPayment),
      Advance::CheckPayment { payment_id: "pay-2".to_string() },
    );

    let before = draft.clone();
    assert!(matches!(apply_payment_status(&mut draft, PaymentStatus::Pending), Advance::Rejected(_)));
    assert_eq!(draft, before);
    assert!(matches!(apply_payment_status(&mut draft, PaymentStatus::Canceled), Advance::Rejected(_)));
    assert_eq!(draft, before);

    assert_eq!(apply_payment_status(&mut draft, PaymentStatus::Succeeded), Advance::Finalize);
    assert_eq!(draft.step, Step::Done);
  }

  #[test]
  fn back_out_of_confirmation_clears_payment_linkage() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:espresso");
    attach_payment(&mut draft, "pay-3".to_string(), "https://pay.example/3".to_string());

    assert_eq!(pick(&mut draft, "order:back"), Advance::Render);
    assert_eq!(draft.step, Step::Payment);
    assert!(draft.payment_method.is_none());
    assert!(draft.payment_id.is_none());
    assert!(draft.payment_url.is_none());
    // the committed drink survives
    assert_eq!(draft.line_items.len(), 1);

    // with no drink in progress, back leads to the category step
    assert_eq!(pick(&mut draft, "order:back"), Advance::Render);
    assert_eq!(draft.step, Step::Category);
    assert_eq!(draft.line_items.len(), 1);
  }

  #[test]
  fn price_invariant_holds_along_the_milk_path() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:milk");
    pick(&mut draft, "item:cappuccino");
    pick(&mut draft, "vol:0.3");
    pick(&mut draft, "milk:oat");
    pick(&mut draft, "syrup:vanilla");

    let base = MENU.find_item("cappuccino").unwrap().price_for("0.3").unwrap();
    let milk = MENU.find_addition(crate::menu::AdditionKind::Milk, "oat").unwrap().surcharge;
    let syrup = MENU.find_addition(crate::menu::AdditionKind::Syrup, "vanilla").unwrap().surcharge;
    assert_eq!(draft.running_price, base + milk + syrup);
    assert_eq!(draft.additions.len(), 2);
  }

  #[test]
  fn comments_survive_back_navigation() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:milk");
    draft.comments.push("без корицы".to_string());
    pick(&mut draft, "item:cappuccino");
    pick(&mut draft, "order:back");
    pick(&mut draft, "order:back");
    assert_eq!(draft.step, Step::Category);
    assert_eq!(draft.comments, vec!["без корицы".to_string()]);
  }

  #[test]
  fn no_actions_after_terminal_step() {
    let mut draft = OrderDraft::new();
    pick(&mut draft, "cat:black");
    pick(&mut draft, "item:espresso");
    assert_eq!(advance(&mut draft, Action::PayCash), Advance::Finalize);
    let done = draft.clone();
    assert_eq!(advance(&mut draft, Action::PayCash), Advance::Ignored);
    assert_eq!(advance(&mut draft, Action::AddAnother), Advance::Ignored);
    assert_eq!(draft, done);
  }
}
