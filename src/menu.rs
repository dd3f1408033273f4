use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Drink categories. Only the first three are reachable from the order flow;
/// the rest appear in the printed price list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  BlackCoffee,
  MilkCoffee,
  Tea,
  Alternative,
  Signature,
  NonCoffee,
}

impl Category {
  pub fn title(self) -> &'static str {
    match self {
      Category::BlackCoffee => "Черный кофе",
      Category::MilkCoffee => "Молочный кофе",
      Category::Tea => "Чай",
      Category::Alternative => "Альтернатива",
      Category::Signature => "Авторское",
      Category::NonCoffee => "Не кофе",
    }
  }
}

/// A drink either comes in one serving at one price, or in several volumes
/// each with its own price. Never both, never neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pricing {
  Fixed { volume: &'static str, price: i64 },
  ByVolume(&'static [(&'static str, i64)]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
  pub id: &'static str,
  pub name: &'static str,
  pub category: Category,
  pub pricing: Pricing,
}

impl MenuItem {
  pub fn price_for(&self, volume: &str) -> Option<i64> {
    match &self.pricing {
      Pricing::Fixed { volume: fixed, price } => (*fixed == volume).then_some(*price),
      Pricing::ByVolume(table) => table.iter().find(|(label, _)| *label == volume).map(|(_, price)| *price),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionKind {
  Milk,
  Syrup,
}

/// An alternative milk or a syrup with a flat surcharge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
  pub id: &'static str,
  pub name: &'static str,
  pub surcharge: i64,
}

const ALT_MILK_SURCHARGE: i64 = 60;
const SYRUP_SURCHARGE: i64 = 40;

const ITEMS: &[MenuItem] = &[
  // Black coffee
  MenuItem {
    id: "espresso",
    name: "Эспрессо",
    category: Category::BlackCoffee,
    pricing: Pricing::Fixed { volume: "0.042", price: 150 },
  },
  MenuItem {
    id: "americano",
    name: "Американо",
    category: Category::BlackCoffee,
    pricing: Pricing::ByVolume(&[("0.2", 180), ("0.3", 200), ("0.4", 260)]),
  },
  MenuItem {
    id: "filter",
    name: "Фильтр кофе",
    category: Category::BlackCoffee,
    pricing: Pricing::ByVolume(&[("0.2", 170), ("0.3", 210), ("0.4", 270)]),
  },
  MenuItem {
    id: "espresso_tonic",
    name: "Эспрессо-тоник",
    category: Category::BlackCoffee,
    pricing: Pricing::Fixed { volume: "0.3", price: 260 },
  },
  MenuItem {
    id: "bumble",
    name: "Бамбл",
    category: Category::BlackCoffee,
    pricing: Pricing::Fixed { volume: "0.3", price: 290 },
  },
  // Milk coffee
  MenuItem {
    id: "cappuccino",
    name: "Капучино",
    category: Category::MilkCoffee,
    pricing: Pricing::ByVolume(&[("0.2", 200), ("0.3", 240), ("0.4", 280)]),
  },
  MenuItem {
    id: "latte",
    name: "Латте",
    category: Category::MilkCoffee,
    pricing: Pricing::ByVolume(&[("0.3", 250), ("0.4", 290)]),
  },
  MenuItem {
    id: "flat_white",
    name: "Флэт уайт",
    category: Category::MilkCoffee,
    pricing: Pricing::ByVolume(&[("0.2", 230)]),
  },
  MenuItem {
    id: "raf",
    name: "Раф",
    category: Category::MilkCoffee,
    pricing: Pricing::ByVolume(&[("0.3", 290)]),
  },
  // Tea: the first volume is the standard serving used by the order flow.
  MenuItem {
    id: "tea_black",
    name: "Чёрный",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_sencha",
    name: "Сенча",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_oolong",
    name: "Улун молочный",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_melon",
    name: "Дыня / карамель",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_cherry",
    name: "Вишневый",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_mint",
    name: "Мятный",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_currant",
    name: "Черная смородина",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_mulled",
    name: "Глинтвейн",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  MenuItem {
    id: "tea_buckwheat",
    name: "Гречишный",
    category: Category::Tea,
    pricing: Pricing::ByVolume(&[("0.3", 180), ("0.5", 250)]),
  },
  // Alternative brews
  MenuItem {
    id: "v60",
    name: "Воронка V60",
    category: Category::Alternative,
    pricing: Pricing::ByVolume(&[("0.3", 240)]),
  },
  MenuItem {
    id: "immersion",
    name: "Иммерсионная воронка",
    category: Category::Alternative,
    pricing: Pricing::ByVolume(&[("0.3", 240)]),
  },
  MenuItem {
    id: "chemex",
    name: "Кемекс",
    category: Category::Alternative,
    pricing: Pricing::ByVolume(&[("0.3", 240)]),
  },
  MenuItem {
    id: "hoop",
    name: "Хуп",
    category: Category::Alternative,
    pricing: Pricing::ByVolume(&[("0.3", 240)]),
  },
  MenuItem {
    id: "aeropress",
    name: "Аэропресс",
    category: Category::Alternative,
    pricing: Pricing::ByVolume(&[("0.2", 220)]),
  },
  // Signature
  MenuItem {
    id: "mimosa",
    name: "Мимоза",
    category: Category::Signature,
    pricing: Pricing::ByVolume(&[("0.3", 300)]),
  },
  MenuItem {
    id: "creme_brunet",
    name: "Крем-брюнет",
    category: Category::Signature,
    pricing: Pricing::ByVolume(&[("0.3", 260)]),
  },
  MenuItem {
    id: "peanut_crunch",
    name: "Арахисовый кранч",
    category: Category::Signature,
    pricing: Pricing::ByVolume(&[("0.3", 300)]),
  },
  // Non-coffee
  MenuItem {
    id: "cocoa_shot",
    name: "Какао-шот 60 мл",
    category: Category::NonCoffee,
    pricing: Pricing::Fixed { volume: "0.06", price: 190 },
  },
  MenuItem {
    id: "cocoa",
    name: "Какао",
    category: Category::NonCoffee,
    pricing: Pricing::ByVolume(&[("0.2", 200), ("0.3", 230), ("0.4", 280)]),
  },
  MenuItem {
    id: "hot_chocolate",
    name: "Горячий шоколад",
    category: Category::NonCoffee,
    pricing: Pricing::ByVolume(&[("0.2", 230), ("0.3", 290)]),
  },
  MenuItem {
    id: "matcha_latte",
    name: "Матча-латте",
    category: Category::NonCoffee,
    pricing: Pricing::ByVolume(&[("0.3", 230), ("0.4", 270)]),
  },
];

const ALT_MILKS: &[Addition] = &[
  Addition { id: "coconut", name: "Кокосовое", surcharge: ALT_MILK_SURCHARGE },
  Addition { id: "hazelnut", name: "Фундучное", surcharge: ALT_MILK_SURCHARGE },
  Addition { id: "banana", name: "Банановое", surcharge: ALT_MILK_SURCHARGE },
  Addition { id: "almond", name: "Миндальное", surcharge: ALT_MILK_SURCHARGE },
  Addition { id: "oat", name: "Овсяное", surcharge: ALT_MILK_SURCHARGE },
  Addition { id: "lactose_free", name: "Безлактозное", surcharge: ALT_MILK_SURCHARGE },
];

const SYRUPS: &[Addition] = &[
  Addition { id: "coconut", name: "Кокос", surcharge: SYRUP_SURCHARGE },
  Addition { id: "double_salted_caramel", name: "Двойная соленая карамель", surcharge: SYRUP_SURCHARGE },
  Addition { id: "mint_eucalyptus", name: "Мята с эвкалиптом", surcharge: SYRUP_SURCHARGE },
  Addition { id: "double_caramel", name: "Двойная карамель", surcharge: SYRUP_SURCHARGE },
  Addition { id: "cherry", name: "Вишня", surcharge: SYRUP_SURCHARGE },
  Addition { id: "irish_cream", name: "Ирландский крем", surcharge: SYRUP_SURCHARGE },
  Addition { id: "red_orange", name: "Красный апельсин", surcharge: SYRUP_SURCHARGE },
  Addition { id: "hazelnut", name: "Лесной орех", surcharge: SYRUP_SURCHARGE },
  Addition { id: "raspberry", name: "Малина", surcharge: SYRUP_SURCHARGE },
  Addition { id: "vanilla", name: "Ваниль", surcharge: SYRUP_SURCHARGE },
  Addition { id: "popcorn", name: "Попкорн", surcharge: SYRUP_SURCHARGE },
];

pub static MENU: Menu = Menu {
  items: ITEMS,
  milks: ALT_MILKS,
  syrups: SYRUPS,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
  #[error("duplicate menu item id: {0}")]
  DuplicateItem(&'static str),
  #[error("menu item {0} advertises no volumes")]
  EmptyVolumes(&'static str),
  #[error("menu item {0} has a non-positive price")]
  BadPrice(&'static str),
  #[error("duplicate addition id: {0}")]
  DuplicateAddition(&'static str),
}

pub struct Menu {
  items: &'static [MenuItem],
  milks: &'static [Addition],
  syrups: &'static [Addition],
}

impl Menu {
  pub fn find_item(&self, id: &str) -> Option<&MenuItem> {
    self.items.iter().find(|item| item.id == id)
  }

  pub fn items_in(&self, category: Category) -> impl Iterator<Item = &MenuItem> {
    self.items.iter().filter(move |item| item.category == category)
  }

  pub fn additions(&self, kind: AdditionKind) -> &[Addition] {
    match kind {
      AdditionKind::Milk => self.milks,
      AdditionKind::Syrup => self.syrups,
    }
  }

  pub fn find_addition(&self, kind: AdditionKind, id: &str) -> Option<&Addition> {
    self.additions(kind).iter().find(|addition| addition.id == id)
  }

  /// Startup integrity check. A catalog violation is a programming error
  /// and aborts boot rather than surfacing per-request.
  pub fn validate(&self) -> Result<(), CatalogError> {
    let mut item_ids = HashSet::new();
    for item in self.items {
      if !item_ids.insert(item.id) {
        return Err(CatalogError::DuplicateItem(item.id));
      }
      match &item.pricing {
        Pricing::Fixed { price, .. } => {
          if *price <= 0 {
            return Err(CatalogError::BadPrice(item.id));
          }
        },
        Pricing::ByVolume(table) => {
          if table.is_empty() {
            return Err(CatalogError::EmptyVolumes(item.id));
          }
          if table.iter().any(|(_, price)| *price <= 0) {
            return Err(CatalogError::BadPrice(item.id));
          }
        },
      }
    }
    for additions in [self.milks, self.syrups] {
      let mut addition_ids = HashSet::new();
      for addition in additions {
        if !addition_ids.insert(addition.id) {
          return Err(CatalogError::DuplicateAddition(addition.id));
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::AdditionKind;
  use super::Category;
  use super::MENU;
  use super::Pricing;

  #[test]
  fn catalog_passes_validation() {
    MENU.validate().expect("shipped catalog must be valid");
  }

  #[test]
  fn finds_items_by_id() {
    let item = MENU.find_item("americano").expect("americano exists");
    assert_eq!(item.category, Category::BlackCoffee);
    assert_eq!(item.price_for("0.3"), Some(200));
    assert!(MENU.find_item("missing").is_none());
  }

  #[test]
  fn fixed_items_price_only_their_serving() {
    let espresso = MENU.find_item("espresso").unwrap();
    assert!(matches!(espresso.pricing, Pricing::Fixed { price: 150, .. }));
    assert_eq!(espresso.price_for("0.042"), Some(150));
    assert_eq!(espresso.price_for("0.3"), None);
  }

  #[test]
  fn finds_additions_per_kind() {
    let oat = MENU.find_addition(AdditionKind::Milk, "oat").expect("oat milk exists");
    assert_eq!(oat.surcharge, 60);
    let vanilla = MENU.find_addition(AdditionKind::Syrup, "vanilla").expect("vanilla exists");
    assert_eq!(vanilla.surcharge, 40);
    // same id, different kinds
    assert_ne!(
      MENU.find_addition(AdditionKind::Milk, "hazelnut").unwrap().name,
      MENU.find_addition(AdditionKind::Syrup, "hazelnut").unwrap().name,
    );
  }

  #[test]
  fn tea_items_have_a_standard_serving_first() {
    for item in MENU.items_in(Category::Tea) {
      let Pricing::ByVolume(table) = &item.pricing else {
        panic!("tea items are volume priced");
      };
      assert_eq!(table[0], ("0.3", 180));
    }
  }
}
