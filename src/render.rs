//! Turns a draft into the text and keyboard of the single order message.
//! Pure: the same draft always renders to the same view.

use teloxide::types::InlineKeyboardButton;
use teloxide::types::InlineKeyboardMarkup;

use crate::menu::AdditionKind;
use crate::menu::Category;
use crate::menu::Menu;
use crate::menu::Pricing;
use crate::order::OrderDraft;
use crate::order::Step;
use crate::util::format_price;

const BACK_LABEL: &str = "Назад";
const NONE_LABEL: &str = "Спасибо, не надо";
const COMMENT_HINT: &str = "Нам можно написать комментарий к заказу в сообщении 😉";

#[derive(Debug, Clone, PartialEq)]
pub struct View {
  pub text: String,
  pub keyboard: InlineKeyboardMarkup,
}

pub fn render(draft: &OrderDraft, menu: &Menu, online_payment_enabled: bool) -> View {
  let summary = summary(draft, menu);
  let prompt = prompt(draft);

  let mut text = summary;
  if !text.is_empty() && !prompt.is_empty() {
    // an extra blank line between the order block and the step prompt
    text.push_str("\n\n\n");
  }
  text.push_str(&prompt);
  if draft.step.accepts_comments() && !draft.comments.is_empty() {
    text.push_str("\n\n");
    text.push_str(COMMENT_HINT);
  }

  View {
    text,
    keyboard: keyboard(draft, menu, online_payment_enabled),
  }
}

/// The order block: finalized drinks numbered, then the in-progress drink
/// with its options, comments, and the total.
fn summary(draft: &OrderDraft, menu: &Menu) -> String {
  if draft.step == Step::Category && draft.is_empty() {
    return String::new();
  }

  let mut text = String::from("📋 *Ваш заказ:*\n");

  for (index, line) in draft.line_items.iter().enumerate() {
    let name = menu.find_item(&line.item_id).map(|item| item.name).unwrap_or(&line.item_id);
    text.push_str(&format!("{}. ☕️ {}", index + 1, name));
    if let Some(volume) = &line.volume {
      text.push_str(&format!(" ({volume}л)"));
    }
    for addition in &line.additions {
      text.push_str(&format!(" + {addition}"));
    }
    text.push_str(&format!(" — {}\n", format_price(line.price)));
  }

  if let Some(item_id) = &draft.item_id {
    let name = menu.find_item(item_id).map(|item| item.name).unwrap_or(item_id);
    text.push_str(&format!("☕️ {name}"));
    if let Some(volume) = &draft.volume {
      text.push_str(&format!(" ({volume}л)"));
    }
    text.push('\n');
  } else if let Some(category) = &draft.category_name {
    text.push_str(&format!("📂 {category}\n"));
  }

  if let Some(milk_id) = &draft.milk {
    let name = menu
      .find_addition(AdditionKind::Milk, milk_id)
      .map(|addition| addition.name)
      .unwrap_or(milk_id);
    text.push_str(&format!("🥛 Молоко: {name}\n"));
  }
  if let Some(syrup_id) = &draft.syrup {
    let name = menu
      .find_addition(AdditionKind::Syrup, syrup_id)
      .map(|addition| addition.name)
      .unwrap_or(syrup_id);
    text.push_str(&format!("🍬 Сироп: {name}\n"));
  }

  for comment in &draft.comments {
    text.push_str(&format!("💬 {comment}\n"));
  }

  let total = draft.total_price();
  if total > 0 {
    text.push_str(&format!("\n💰 *Итого: {}*", format_price(total)));
  }

  text
}

fn prompt(draft: &OrderDraft) -> String {
  match draft.step {
    Step::Category => {
      if draft.line_items.is_empty() {
        "Привет! 🙌 Что вам приготовить?".to_string()
      } else {
        "Что вам приготовить еще?".to_string()
      }
    },
    Step::BlackCoffee | Step::MilkCoffee | Step::Tea => "Отличный выбор! Какой именно?".to_string(),
    Step::Volume => "Отличный выбор! Теперь давайте определимся с объемом!".to_string(),
    Step::AltMilk => "Может на альтернативном молоке?".to_string(),
    Step::Syrup => "А как насчет сиропа?".to_string(),
    Step::Payment => "Чудесно! Как будете оплачивать заказ?".to_string(),
    Step::AwaitingOnline => {
      let mut text = String::from("Оплатите заказ по ссылке и нажмите «Я оплатил».");
      if let Some(url) = &draft.payment_url {
        text.push_str(&format!("\n\n[Ссылка на оплату]({url})"));
      }
      text
    },
    Step::Done => {
      let mut text = String::from("Супер! Ждем 👍");
      if let Some(number) = draft.order_number {
        text.push_str(&format!("\n\n🔢 Номер вашего заказа: #{number}"));
      }
      text
    },
  }
}

fn keyboard(draft: &OrderDraft, menu: &Menu, online_payment_enabled: bool) -> InlineKeyboardMarkup {
  let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

  match draft.step {
    Step::Category => {
      rows.push(vec![InlineKeyboardButton::callback("Черный кофе", "cat:black")]);
      rows.push(vec![InlineKeyboardButton::callback("Молочный кофе", "cat:milk")]);
      rows.push(vec![InlineKeyboardButton::callback("Чай 0,3", "cat:tea")]);
    },
    Step::BlackCoffee => push_item_rows(&mut rows, menu, Category::BlackCoffee),
    Step::MilkCoffee => push_item_rows(&mut rows, menu, Category::MilkCoffee),
    Step::Tea => push_item_rows(&mut rows, menu, Category::Tea),
    Step::Volume => {
      if let Some(item) = draft.item_id.as_deref().and_then(|id| menu.find_item(id))
        && let Pricing::ByVolume(table) = &item.pricing
      {
        for (volume, _) in *table {
          rows.push(vec![InlineKeyboardButton::callback(
            format!("{volume} л"),
            format!("vol:{volume}"),
          )]);
        }
      }
      rows.push(back_row());
    },
    Step::AltMilk => {
      rows.push(vec![InlineKeyboardButton::callback(NONE_LABEL, "milk:none")]);
      for milk in menu.additions(AdditionKind::Milk) {
        rows.push(vec![InlineKeyboardButton::callback(milk.name, format!("milk:{}", milk.id))]);
      }
      rows.push(back_row());
    },
    Step::Syrup => {
      rows.push(vec![InlineKeyboardButton::callback(NONE_LABEL, "syrup:none")]);
      for syrup in menu.additions(AdditionKind::Syrup) {
        rows.push(vec![InlineKeyboardButton::callback(syrup.name, format!("syrup:{}", syrup.id))]);
      }
      rows.push(back_row());
    },
    Step::Payment => {
      rows.push(vec![InlineKeyboardButton::callback("➕ Добавить еще напиток", "order:more")]);
      rows.push(vec![InlineKeyboardButton::callback("Оплатить на кассе", "pay:cash")]);
      if online_payment_enabled {
        rows.push(vec![InlineKeyboardButton::callback("Оплатить онлайн", "pay:online")]);
      }
      rows.push(back_row());
    },
    Step::AwaitingOnline => {
      rows.push(vec![InlineKeyboardButton::callback("Я оплатил", "pay:check")]);
      rows.push(back_row());
    },
    Step::Done => {},
  }

  InlineKeyboardMarkup::new(rows)
}

fn push_item_rows(rows: &mut Vec<Vec<InlineKeyboardButton>>, menu: &Menu, category: Category) {
  for item in menu.items_in(category) {
    rows.push(vec![InlineKeyboardButton::callback(item.name, format!("item:{}", item.id))]);
  }
  rows.push(back_row());
}

fn back_row() -> Vec<InlineKeyboardButton> {
  vec![InlineKeyboardButton::callback(BACK_LABEL, "order:back")]
}

/// The staff-group notification for a finalized order.
pub fn staff_order_text(draft: &OrderDraft, menu: &Menu, user_label: &str) -> String {
  let number = draft.order_number.unwrap_or_default();
  let payment = draft.payment_method.map(|method| method.label()).unwrap_or("❓ Не указан");
  format!(
    "🔔 Новый заказ #{number}!\n\n{}\n\n{payment}\n🔢 Номер заказа: #{number}\n👤 Пользователь: {user_label}",
    summary(draft, menu),
  )
}

/// The full price list shown by /menu.
pub fn price_list(menu: &Menu) -> String {
  let mut text = String::from("📜 *Меню*\n");
  for category in [
    Category::BlackCoffee,
    Category::MilkCoffee,
    Category::Tea,
    Category::Alternative,
    Category::Signature,
    Category::NonCoffee,
  ] {
    text.push_str(&format!("\n*{}*\n", category.title()));
    for item in menu.items_in(category) {
      match &item.pricing {
        Pricing::Fixed { volume, price } => {
          text.push_str(&format!("{} ({volume}) — {}\n", item.name, format_price(*price)));
        },
        Pricing::ByVolume(table) => {
          let prices = table
            .iter()
            .map(|(volume, price)| format!("{volume}: {}", format_price(*price)))
            .collect::<Vec<_>>()
            .join(" · ");
          text.push_str(&format!("{} — {prices}\n", item.name));
        },
      }
    }
  }
  text.push_str("\n*Добавки*\n");
  if let Some(milk) = menu.additions(AdditionKind::Milk).first() {
    text.push_str(&format!("Альтернативное молоко — +{}\n", format_price(milk.surcharge)));
  }
  if let Some(syrup) = menu.additions(AdditionKind::Syrup).first() {
    text.push_str(&format!("Сироп — +{}\n", format_price(syrup.surcharge)));
  }
  text
}
