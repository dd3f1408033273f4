use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::Dialogue;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::types::ChatId;
use teloxide::types::InlineKeyboardButton;
use teloxide::types::InlineKeyboardMarkup;
use teloxide::types::Message;
use teloxide::types::ParseMode;
use teloxide::types::User;
use teloxide::utils::command::BotCommands;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::bot::Command;
use crate::bot::DialogueStorage;
use crate::bot::HandlerResult;
use crate::bot::context::AppContext;
use crate::bot::state::ConversationState;
use crate::engine;
use crate::engine::Action;
use crate::engine::Advance;
use crate::menu::MENU;
use crate::order::OrderDraft;
use crate::render;
use crate::util::moscow_hour;

type SharedContext = Arc<AppContext>;
type BotDialogue = Dialogue<ConversationState, DialogueStorage>;

const OPEN_HOUR: u32 = 8;
const CLOSE_HOUR: u32 = 21;

const BOT_PAUSED: &str = "Работа бота временно приостановлена";
const CLOSED: &str = "Мы сейчас закрыты. Работаем с 8 до 21 по МСК.";
const NO_ACTIVE_ORDER: &str = "Нет активного заказа. Отправьте /start.";
const ONLINE_UNAVAILABLE: &str = "Онлайн-оплата сейчас недоступна. Оплатите на кассе.";
const PAYMENT_CREATE_FAILED: &str = "Ошибка создания платежа. Попробуйте позже или оплатите на кассе.";
const PAYMENT_CHECK_FAILED: &str = "Не удалось проверить оплату. Попробуйте позже.";
const HIGH_LOAD_NOTICE: &str =
  "Сейчас у нас высокая загрузка, но мы постараемся приготовить ваш заказ в течении 10 минут.";

pub fn build_schema() -> UpdateHandler<anyhow::Error> {
  let message_handler = Update::filter_message()
    .enter_dialogue::<Message, DialogueStorage, ConversationState>()
    .branch(command_branch())
    .branch(dptree::case![ConversationState::Ordering(draft)].endpoint(handle_order_message))
    .branch(dptree::endpoint(handle_idle_text));

  let callback_handler = Update::filter_callback_query()
    .enter_dialogue::<CallbackQuery, DialogueStorage, ConversationState>()
    .endpoint(handle_callback_query);

  dptree::entry().branch(message_handler).branch(callback_handler)
}

fn command_branch() -> UpdateHandler<anyhow::Error> {
  dptree::entry()
    .filter_command::<Command>()
    .branch(dptree::case![Command::Start].endpoint(handle_start))
    .branch(dptree::case![Command::Menu].endpoint(handle_menu))
    .branch(dptree::case![Command::Help].endpoint(handle_help))
}

#[instrument(skip(bot, ctx, dialogue, msg))]
async fn handle_start(bot: Bot, dialogue: BotDialogue, ctx: SharedContext, msg: Message) -> HandlerResult {
  if let Some(reason) = closed_reason(&ctx, msg.chat.id).await {
    bot.send_message(msg.chat.id, reason).await?;
    return Ok(());
  }

  // starting over abandons any previous draft in place
  dialogue.reset().await?;
  let mut draft = OrderDraft::new();
  let view = render::render(&draft, &MENU, online_payment_available(&ctx).await);
  let sent = bot
    .send_message(msg.chat.id, view.text)
    .parse_mode(ParseMode::Markdown)
    .reply_markup(view.keyboard)
    .await?;
  draft.message_id = Some(sent.id);
  dialogue.update(ConversationState::Ordering(draft)).await?;
  info!(chat_id = %msg.chat.id, "started new order");
  Ok(())
}

#[instrument(skip(bot, msg))]
async fn handle_menu(bot: Bot, msg: Message) -> HandlerResult {
  info!(chat_id = %msg.chat.id, "received /menu command");
  bot
    .send_message(msg.chat.id, render::price_list(&MENU))
    .parse_mode(ParseMode::Markdown)
    .await?;
  Ok(())
}

#[instrument(skip(bot, msg))]
async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
  info!(chat_id = %msg.chat.id, "received /help command");
  let mut text = Command::descriptions().to_string();
  text.push_str("\n\nЗаказ собирается кнопками под сообщением. Начните с /start.");
  bot.send_message(msg.chat.id, text).await?;
  Ok(())
}

/// Plain messages during an order become comments: the text is attached to
/// the draft, the user's message is removed, and the order message
/// re-renders with the comment shown.
#[instrument(skip(bot, ctx, dialogue, msg, draft))]
async fn handle_order_message(
  bot: Bot,
  dialogue: BotDialogue,
  ctx: SharedContext,
  msg: Message,
  mut draft: OrderDraft,
) -> HandlerResult {
  if let Some(reason) = closed_reason(&ctx, msg.chat.id).await {
    bot.send_message(msg.chat.id, reason).await?;
    return Ok(());
  }
  if !draft.step.accepts_comments() || draft.message_id.is_none() {
    return Ok(());
  }

  draft.comments.push(comment_text(&msg));
  info!(chat_id = %msg.chat.id, count = draft.comments.len(), "attached order comment");

  if let Err(err) = bot.delete_message(msg.chat.id, msg.id).await {
    warn!(error = %err, chat_id = %msg.chat.id, "failed to delete comment message");
  }
  edit_order_message(&bot, &ctx, msg.chat.id, &draft).await;
  dialogue.update(ConversationState::Ordering(draft)).await?;
  Ok(())
}

#[instrument(skip(bot, ctx, msg))]
async fn handle_idle_text(bot: Bot, ctx: SharedContext, msg: Message, state: ConversationState) -> HandlerResult {
  if matches!(state, ConversationState::Idle)
    && !ctx.is_staff_chat(msg.chat.id)
    && let Some(text) = msg.text()
  {
    if text.starts_with('/') {
      // unknown command, ignore to let telegram handle
    } else {
      info!(chat_id = %msg.chat.id, "idle chat received unrecognized message");
      bot.send_message(msg.chat.id, "Чтобы сделать заказ, отправьте /start.").await?;
    }
  }
  Ok(())
}

#[instrument(skip(bot, ctx, dialogue, query))]
async fn handle_callback_query(
  bot: Bot,
  ctx: SharedContext,
  query: CallbackQuery,
  dialogue: BotDialogue,
) -> HandlerResult {
  let message_ctx = query.message.as_ref().map(|message| (message.chat().id, message.id()));
  let data = query.data.clone().unwrap_or_default();
  if let Some((chat_id, _)) = message_ctx {
    info!(user_id = query.from.id.0, chat_id = %chat_id, callback = %data, "handling callback query");
  }

  // staff-side button on the order notification
  if let Some(customer) = data.strip_prefix("load:") {
    let toast = handle_high_load(&bot, &ctx, message_ctx.map(|(chat, _)| chat), customer).await?;
    bot.answer_callback_query(query.id).text(toast).await?;
    return Ok(());
  }

  if let Some((chat_id, _)) = message_ctx
    && let Some(reason) = closed_reason(&ctx, chat_id).await
  {
    bot.answer_callback_query(query.id).text(reason).show_alert(true).await?;
    return Ok(());
  }

  let (Some(action), Some((chat_id, _))) = (Action::parse(&data), message_ctx) else {
    bot.answer_callback_query(query.id).await?;
    return Ok(());
  };

  let Some(ConversationState::Ordering(mut draft)) = dialogue.get().await? else {
    bot.answer_callback_query(query.id).text(NO_ACTIVE_ORDER).await?;
    return Ok(());
  };

  let mut toast: Option<String> = None;
  match engine::apply(&mut draft, &action, &MENU) {
    Advance::Render => {
      edit_order_message(&bot, &ctx, chat_id, &draft).await;
      dialogue.update(ConversationState::Ordering(draft)).await?;
    },
    Advance::Finalize => {
      finalize_order(&bot, &ctx, &dialogue, chat_id, &query.from, &mut draft).await?;
    },
    Advance::StartOnlinePayment { amount } => {
      toast = start_online_payment(&bot, &ctx, &dialogue, chat_id, &query.from, &mut draft, amount).await?;
    },
    Advance::CheckPayment { payment_id } => {
      toast = check_online_payment(&bot, &ctx, &dialogue, chat_id, &query.from, &mut draft, &payment_id).await?;
    },
    Advance::Rejected(text) => toast = Some(text.to_string()),
    Advance::Ignored => {},
  }

  if let Some(text) = toast {
    bot.answer_callback_query(query.id).text(text).await?;
  } else {
    bot.answer_callback_query(query.id).await?;
  }
  Ok(())
}

/// Creates the online payment for the cumulative total. The draft only
/// moves once the gateway accepted the payment; a failure leaves it at the
/// payment step untouched.
async fn start_online_payment(
  bot: &Bot,
  ctx: &SharedContext,
  dialogue: &BotDialogue,
  chat: ChatId,
  user: &User,
  draft: &mut OrderDraft,
  amount: i64,
) -> Result<Option<String>> {
  let settings = ctx.store().settings().await;
  let Some(payments) = ctx.payments().filter(|_| settings.online_payment_enabled) else {
    return Ok(Some(ONLINE_UNAVAILABLE.to_string()));
  };

  let description = format!("Заказ от {}", user_label(user));
  let idempotence_key = format!("{}-{}", chat, Utc::now().timestamp_millis());
  match payments.create_payment(amount, &description, &idempotence_key).await {
    Ok(payment) => {
      engine::attach_payment(draft, payment.id, payment.confirmation_url);
      edit_order_message(bot, ctx, chat, draft).await;
      dialogue.update(ConversationState::Ordering(draft.clone())).await?;
      Ok(None)
    },
    Err(err) => {
      warn!(error = %err, chat_id = %chat, amount, "failed to create payment");
      Ok(Some(PAYMENT_CREATE_FAILED.to_string()))
    },
  }
}

async fn check_online_payment(
  bot: &Bot,
  ctx: &SharedContext,
  dialogue: &BotDialogue,
  chat: ChatId,
  user: &User,
  draft: &mut OrderDraft,
  payment_id: &str,
) -> Result<Option<String>> {
  let Some(payments) = ctx.payments() else {
    return Ok(Some(ONLINE_UNAVAILABLE.to_string()));
  };
  match payments.payment_status(payment_id).await {
    Ok(status) => match engine::apply_payment_status(draft, status) {
      Advance::Finalize => {
        finalize_order(bot, ctx, dialogue, chat, user, draft).await?;
        Ok(None)
      },
      Advance::Rejected(text) => Ok(Some(text.to_string())),
      _ => Ok(None),
    },
    Err(err) => {
      warn!(error = %err, chat_id = %chat, payment_id, "failed to poll payment status");
      Ok(Some(PAYMENT_CHECK_FAILED.to_string()))
    },
  }
}

/// Terminal step: draw the daily order number once, notify the staff chat
/// once (best-effort), show the final render and drop the draft.
#[instrument(skip(bot, ctx, dialogue, user, draft))]
async fn finalize_order(
  bot: &Bot,
  ctx: &SharedContext,
  dialogue: &BotDialogue,
  chat: ChatId,
  user: &User,
  draft: &mut OrderDraft,
) -> HandlerResult {
  if draft.order_number.is_none() {
    let number = ctx.store().next_daily_order_number().await?;
    draft.assign_order_number(number);

    let text = render::staff_order_text(draft, &MENU, &user_label(user));
    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
      "⚠️ Высокая загрузка",
      format!("load:{}", user.id.0),
    )]]);
    if let Err(err) = bot
      .send_message(ctx.staff_chat(), text)
      .parse_mode(ParseMode::Markdown)
      .reply_markup(keyboard)
      .await
    {
      // the order is already placed from the user's perspective
      warn!(error = %err, order_number = number, "failed to deliver order to staff chat");
    }
    info!(
      order_number = number,
      user_id = user.id.0,
      total = draft.total_price(),
      payment = ?draft.payment_method,
      "order finalized"
    );
  }

  edit_order_message(bot, ctx, chat, draft).await;
  dialogue.reset().await?;
  Ok(())
}

/// Re-renders the draft into its single chat message. Edit failures are
/// swallowed: the next successful render resynchronizes the visible state.
async fn edit_order_message(bot: &Bot, ctx: &SharedContext, chat: ChatId, draft: &OrderDraft) {
  let Some(message_id) = draft.message_id else {
    return;
  };
  let view = render::render(draft, &MENU, online_payment_available(ctx).await);
  let request = bot
    .edit_message_text(chat, message_id, view.text)
    .parse_mode(ParseMode::Markdown)
    .reply_markup(view.keyboard);
  match request.await {
    Ok(_) => {},
    Err(RequestError::Api(ApiError::MessageNotModified)) => {
      info!(chat_id = %chat, message_id = %message_id, "order message already current");
    },
    Err(err) => {
      warn!(error = %err, chat_id = %chat, message_id = %message_id, "failed to edit order message");
    },
  }
}

async fn handle_high_load(bot: &Bot, ctx: &SharedContext, origin: Option<ChatId>, customer: &str) -> Result<String> {
  if !origin.is_some_and(|chat| ctx.is_staff_chat(chat)) {
    return Ok("Нет доступа".to_string());
  }
  let Ok(user_id) = customer.parse::<i64>() else {
    return Ok("Ошибка: ID пользователя не найден.".to_string());
  };
  match bot.send_message(ChatId(user_id), HIGH_LOAD_NOTICE).await {
    Ok(_) => {
      info!(user_id, "sent high load notice");
      Ok("Уведомление отправлено пользователю.".to_string())
    },
    Err(err) => {
      warn!(error = %err, user_id, "failed to send high load notice");
      Ok("Ошибка отправки (бот заблокирован?).".to_string())
    },
  }
}

/// `None` when the shop accepts orders from this chat right now. The staff
/// chat bypasses both the pause flag and working hours.
async fn closed_reason(ctx: &SharedContext, chat: ChatId) -> Option<&'static str> {
  if ctx.is_staff_chat(chat) {
    return None;
  }
  if !ctx.store().settings().await.bot_active {
    return Some(BOT_PAUSED);
  }
  if outside_work_hours(moscow_hour(Utc::now())) {
    return Some(CLOSED);
  }
  None
}

fn outside_work_hours(hour: u32) -> bool {
  !(OPEN_HOUR .. CLOSE_HOUR).contains(&hour)
}

async fn online_payment_available(ctx: &SharedContext) -> bool {
  ctx.payments().is_some() && ctx.store().settings().await.online_payment_enabled
}

fn comment_text(msg: &Message) -> String {
  if let Some(text) = msg.text() {
    return text.to_string();
  }
  if let Some(caption) = msg.caption() {
    return caption.to_string();
  }
  let placeholder = if msg.sticker().is_some() {
    "[Стикер]"
  } else if msg.photo().is_some() {
    "[Фото]"
  } else if msg.voice().is_some() {
    "[Голосовое сообщение]"
  } else if msg.video().is_some() {
    "[Видео]"
  } else if msg.document().is_some() {
    "[Документ]"
  } else if msg.audio().is_some() {
    "[Аудио]"
  } else {
    "[Сообщение]"
  };
  placeholder.to_string()
}

fn user_label(user: &User) -> String {
  match &user.username {
    Some(username) => format!("@{username}"),
    None => user.first_name.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::outside_work_hours;
  use super::user_label;
  use teloxide::types::User;
  use teloxide::types::UserId;

  fn user(username: Option<&str>) -> User {
    User {
      id: UserId(7),
      is_bot: false,
      first_name: "Ivan".to_string(),
      last_name: None,
      username: username.map(|value| value.to_string()),
      language_code: None,
      is_premium: false,
      added_to_attachment_menu: false,
    }
  }

  #[test]
  fn labels_prefer_the_username() {
    assert_eq!(user_label(&user(Some("ivan"))), "@ivan");
    assert_eq!(user_label(&user(None)), "Ivan");
  }

  #[test]
  fn work_hours_are_eight_to_nine_pm() {
    assert!(outside_work_hours(7));
    assert!(!outside_work_hours(8));
    assert!(!outside_work_hours(20));
    assert!(outside_work_hours(21));
    assert!(outside_work_hours(23));
  }
}
