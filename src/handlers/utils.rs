use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup,
};

use crate::models::{Service, ServiceField, User};

/// Экранирование MarkdownV2.
pub fn escape_markdown_v2(text: &str) -> String {
    let specials = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if specials.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// "1500 ₽" или "Бесплатно".
pub fn format_price(price: i64) -> String {
    if price > 0 {
        format!("{} ₽", price)
    } else {
        "Бесплатно".to_string()
    }
}

/// Минуты в человекочитаемый вид: "45 мин", "1ч", "1ч 30мин".
pub fn format_duration(minutes: i32) -> String {
    if minutes >= 60 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest > 0 {
            format!("{}ч {}мин", hours, rest)
        } else {
            format!("{}ч", hours)
        }
    } else {
        format!("{} мин", minutes)
    }
}

/// Подпись клиента в админских сообщениях: имя + @username.
pub fn user_label(user: Option<&User>) -> String {
    match user {
        Some(u) => format!("{} {}", u.display_name(), u.handle()).trim().to_string(),
        None => "Неизвестный".to_string(),
    }
}

/// Главное меню клиента.
pub fn main_menu_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![
            vec![
                KeyboardButton::new("📋 Услуги и цены"),
                KeyboardButton::new("📅 Записаться"),
            ],
            vec![
                KeyboardButton::new("🛒 Сделать заказ"),
                KeyboardButton::new("📩 Оставить заявку"),
            ],
            vec![
                KeyboardButton::new("📞 Контакты"),
                KeyboardButton::new("👤 Мои записи"),
            ],
        ])
        .resize_keyboard(),
    )
}

/// Меню администратора.
pub fn admin_menu_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![
            vec![
                KeyboardButton::new("📊 Статистика"),
                KeyboardButton::new("📋 Новые записи"),
            ],
            vec![
                KeyboardButton::new("🛒 Заказы"),
                KeyboardButton::new("📩 Заявки"),
            ],
            vec![
                KeyboardButton::new("🛠 Услуги"),
                KeyboardButton::new("👥 Пользователи"),
            ],
            vec![
                KeyboardButton::new("📣 Рассылка"),
                KeyboardButton::new("⬅️ Обычное меню"),
            ],
        ])
        .resize_keyboard(),
    )
}

/// Одна строка с кнопкой отмены текущего диалога.
pub fn cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("❌ Отмена", "cancel")]])
}

/// Кнопка «без комментария» (+ отмена) для шага комментария.
pub fn skip_comment_keyboard(action: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("Без комментария →", action.to_string())],
        vec![InlineKeyboardButton::callback("❌ Отмена", "cancel")],
    ])
}

/// Выбор услуги при записи: по кнопке на активную услугу.
pub fn services_keyboard(services: &[Service]) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = services
        .iter()
        .map(|s| {
            vec![InlineKeyboardButton::callback(
                format!("{} — {}", s.name, format_price(s.price)),
                format!("book_service_{}", s.id),
            )]
        })
        .collect();
    keyboard.push(vec![InlineKeyboardButton::callback("❌ Отмена", "cancel")]);
    InlineKeyboardMarkup::new(keyboard)
}

/// Кнопки подтверждения/отмены записи в уведомлении админу.
pub fn booking_admin_keyboard(booking_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "✅ Подтвердить",
            format!("confirm_{}", booking_id),
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Отменить",
            format!("cancel_booking_{}", booking_id),
        )],
    ])
}

/// Кнопки управления услугой в админском списке.
pub fn service_admin_keyboard(service: &Service) -> InlineKeyboardMarkup {
    let toggle = if service.active {
        InlineKeyboardButton::callback("🚫 Скрыть", format!("svc_off_{}", service.id))
    } else {
        InlineKeyboardButton::callback("♻️ Вернуть", format!("svc_on_{}", service.id))
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✏️ Изменить", format!("svc_edit_{}", service.id)),
            toggle,
        ],
        vec![InlineKeyboardButton::callback(
            "🗑 Удалить",
            format!("svc_del_{}", service.id),
        )],
    ])
}

/// Выбор редактируемого поля услуги.
pub fn service_fields_keyboard(service_id: i64) -> InlineKeyboardMarkup {
    let row = |field: ServiceField, label: &str| {
        InlineKeyboardButton::callback(
            label.to_string(),
            format!("svc_field_{}_{}", service_id, field.as_str()),
        )
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            row(ServiceField::Name, "Название"),
            row(ServiceField::Price, "Цена"),
        ],
        vec![
            row(ServiceField::Duration, "Длительность"),
            row(ServiceField::Description, "Описание"),
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markdown_specials() {
        assert_eq!(escape_markdown_v2("a.b"), "a\\.b");
        assert_eq!(escape_markdown_v2("15.02 (пн)"), "15\\.02 \\(пн\\)");
        assert_eq!(escape_markdown_v2("без спецсимволов"), "без спецсимволов");
    }

    #[test]
    fn formats_price_and_duration() {
        assert_eq!(format_price(1500), "1500 ₽");
        assert_eq!(format_price(0), "Бесплатно");

        assert_eq!(format_duration(30), "30 мин");
        assert_eq!(format_duration(60), "1ч");
        assert_eq!(format_duration(90), "1ч 30мин");
        assert_eq!(format_duration(120), "2ч");
    }
}
