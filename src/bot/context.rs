use teloxide::types::ChatId;

use crate::payments::YooKassa;
use crate::store::Store;

#[derive(Clone)]
pub struct AppContext {
  store: Store,
  payments: Option<YooKassa>,
  staff_chat: ChatId,
}

impl AppContext {
  pub fn new(store: Store, payments: Option<YooKassa>, staff_chat: ChatId) -> Self {
    Self {
      store,
      payments,
      staff_chat,
    }
  }

  pub fn store(&self) -> &Store {
    &self.store
  }

  pub fn payments(&self) -> Option<&YooKassa> {
    self.payments.as_ref()
  }

  pub fn staff_chat(&self) -> ChatId {
    self.staff_chat
  }

  pub fn is_staff_chat(&self, chat: ChatId) -> bool {
    chat == self.staff_chat
  }
}
