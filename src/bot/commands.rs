use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
  /// Начать новый заказ
  Start,
  /// Показать меню и цены
  Menu,
  /// Помощь
  Help,
}
