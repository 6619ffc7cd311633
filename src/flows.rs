//! Движок многошаговых диалогов.
//!
//! Чистая машина состояний над [`Session`]: `advance` принимает событие
//! (текст или кнопка), двигает шаг, накапливает черновик и на терминальном
//! шаге возвращает эффект-коммит. Ввода-вывода здесь нет — эффекты
//! исполняют обработчики.

use serde::{Deserialize, Serialize};

use crate::models::ServiceField;

/// Текущий шаг диалога. Отсутствие шага — покой (idle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    // запись на услугу
    BookingService,
    BookingDate,
    BookingTime,
    BookingComment,
    // заказ
    OrderItems,
    OrderAddress,
    OrderComment,
    // заявка
    RequestMessage,
    // админ: создание услуги
    ServiceName,
    ServicePrice,
    ServiceDuration,
    ServiceDescription,
    // админ: редактирование поля услуги
    ServiceEditValue,
    // админ: рассылка
    Broadcast,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub service_id: i64,
    pub service_name: String,
    pub date: String,
    pub time: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub items: String,
    pub address: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub name: String,
    pub price: i64,
    pub duration: i32,
    pub description: Option<String>,
}

/// Цель редактирования: какая услуга и какое поле.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditTarget {
    pub service_id: i64,
    pub field: ServiceField,
}

/// Состояние диалога одного пользователя. Живёт только в памяти;
/// потеря при рестарте лишь обрывает незавершённый диалог.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub step: Option<Step>,
    pub booking: Option<BookingDraft>,
    pub order: Option<OrderDraft>,
    pub new_service: Option<ServiceDraft>,
    pub edit: Option<EditTarget>,
}

impl Session {
    /// Сброс в покой. Все черновики отбрасываются.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    pub fn is_idle(&self) -> bool {
        self.step.is_none()
    }

    // Входы в диалоги. Любой вход отбрасывает прочие черновики:
    // активен максимум один диалог на пользователя.

    pub fn start_booking(&mut self) {
        self.reset();
        self.step = Some(Step::BookingService);
    }

    pub fn start_order(&mut self) {
        self.reset();
        self.step = Some(Step::OrderItems);
        self.order = Some(OrderDraft::default());
    }

    pub fn start_request(&mut self) {
        self.reset();
        self.step = Some(Step::RequestMessage);
    }

    pub fn start_service_add(&mut self) {
        self.reset();
        self.step = Some(Step::ServiceName);
        self.new_service = Some(ServiceDraft::default());
    }

    pub fn start_broadcast(&mut self) {
        self.reset();
        self.step = Some(Step::Broadcast);
    }
}

/// Входящее событие диалога, уже привязанное к пользователю.
#[derive(Debug, Clone)]
pub enum Event<'a> {
    /// Свободный текст.
    Text(&'a str),
    /// Кнопка выбора услуги (имя — снимок на момент выбора).
    ServiceChosen { id: i64, name: String },
    /// Кнопка выбора редактируемого поля услуги.
    EditField { service_id: i64, field: ServiceField },
    /// Кнопка «без комментария» — эквивалент пустого текста.
    SkipComment,
    /// Кнопка отмены, допустима на любом шаге.
    Cancel,
}

/// Результат шага. Prompt-варианты — что спросить дальше,
/// Commit-варианты — терминальные.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AskDate { service_name: String },
    AskTime { date: String },
    AskBookingComment { time: String },
    AskAddress,
    AskOrderComment,
    AskServicePrice { name: String },
    AskServiceDuration,
    AskServiceDescription,
    AskEditValue { service_id: i64, field: ServiceField },

    CommitBooking(BookingDraft),
    CommitOrder(OrderDraft),
    CommitRequest { message: String },
    CommitService(ServiceDraft),
    UpdateServiceField { service_id: i64, field: ServiceField, value: String },
    Broadcast { text: String },

    Cancelled,
    /// Событие не подходит к текущему шагу (или черновик пропал после
    /// отмены, а у клиента осталась старая клавиатура). Молча игнорируем.
    Ignored,
}

/// Цена: нечисловой ввод мягко приводится к 0.
/// Осознанно унаследованное поведение, не меняем без отдельного решения.
pub fn parse_price(text: &str) -> i64 {
    text.trim().parse::<i64>().unwrap_or(0).max(0)
}

/// Длительность в минутах: нечисловой или неположительный ввод — 60.
pub fn parse_duration(text: &str) -> i32 {
    match text.trim().parse::<i32>() {
        Ok(n) if n > 0 => n,
        _ => 60,
    }
}

/// Один переход машины состояний: `(session, event) -> effect`.
pub fn advance(session: &mut Session, event: Event<'_>) -> Effect {
    match event {
        Event::Cancel => {
            session.reset();
            Effect::Cancelled
        }

        Event::ServiceChosen { id, name } => {
            // Выбор услуги начинает сбор данных записи независимо от того,
            // что было в сессии до этого.
            session.reset();
            session.booking = Some(BookingDraft {
                service_id: id,
                service_name: name.clone(),
                ..BookingDraft::default()
            });
            session.step = Some(Step::BookingDate);
            Effect::AskDate { service_name: name }
        }

        Event::EditField { service_id, field } => {
            session.reset();
            session.edit = Some(EditTarget { service_id, field });
            session.step = Some(Step::ServiceEditValue);
            Effect::AskEditValue { service_id, field }
        }

        Event::SkipComment => match session.step {
            Some(Step::BookingComment) => match session.booking.take() {
                Some(mut draft) => {
                    draft.comment = None;
                    session.reset();
                    Effect::CommitBooking(draft)
                }
                None => Effect::Ignored,
            },
            Some(Step::OrderComment) => match session.order.take() {
                Some(mut draft) => {
                    draft.comment = None;
                    session.reset();
                    Effect::CommitOrder(draft)
                }
                None => Effect::Ignored,
            },
            _ => Effect::Ignored,
        },

        Event::Text(text) => advance_text(session, text),
    }
}

fn advance_text(session: &mut Session, text: &str) -> Effect {
    match session.step {
        Some(Step::BookingDate) => match session.booking.as_mut() {
            Some(draft) => {
                draft.date = text.to_string();
                session.step = Some(Step::BookingTime);
                Effect::AskTime { date: text.to_string() }
            }
            None => Effect::Ignored,
        },

        Some(Step::BookingTime) => match session.booking.as_mut() {
            Some(draft) => {
                draft.time = text.to_string();
                session.step = Some(Step::BookingComment);
                Effect::AskBookingComment { time: text.to_string() }
            }
            None => Effect::Ignored,
        },

        Some(Step::BookingComment) => match session.booking.take() {
            Some(mut draft) => {
                draft.comment = if text.trim().is_empty() {
                    None
                } else {
                    Some(text.to_string())
                };
                session.reset();
                Effect::CommitBooking(draft)
            }
            None => Effect::Ignored,
        },

        Some(Step::OrderItems) => match session.order.as_mut() {
            Some(draft) => {
                draft.items = text.to_string();
                session.step = Some(Step::OrderAddress);
                Effect::AskAddress
            }
            None => Effect::Ignored,
        },

        Some(Step::OrderAddress) => match session.order.as_mut() {
            Some(draft) => {
                draft.address = text.to_string();
                session.step = Some(Step::OrderComment);
                Effect::AskOrderComment
            }
            None => Effect::Ignored,
        },

        Some(Step::OrderComment) => match session.order.take() {
            Some(mut draft) => {
                draft.comment = if text.trim().is_empty() {
                    None
                } else {
                    Some(text.to_string())
                };
                session.reset();
                Effect::CommitOrder(draft)
            }
            None => Effect::Ignored,
        },

        Some(Step::RequestMessage) => {
            session.reset();
            Effect::CommitRequest { message: text.to_string() }
        }

        Some(Step::ServiceName) => match session.new_service.as_mut() {
            Some(draft) => {
                draft.name = text.to_string();
                session.step = Some(Step::ServicePrice);
                Effect::AskServicePrice { name: text.to_string() }
            }
            None => Effect::Ignored,
        },

        Some(Step::ServicePrice) => match session.new_service.as_mut() {
            Some(draft) => {
                draft.price = parse_price(text);
                session.step = Some(Step::ServiceDuration);
                Effect::AskServiceDuration
            }
            None => Effect::Ignored,
        },

        Some(Step::ServiceDuration) => match session.new_service.as_mut() {
            Some(draft) => {
                draft.duration = parse_duration(text);
                session.step = Some(Step::ServiceDescription);
                Effect::AskServiceDescription
            }
            None => Effect::Ignored,
        },

        Some(Step::ServiceDescription) => match session.new_service.take() {
            Some(mut draft) => {
                // "-" — явный сентинел «без описания»
                draft.description = if text.trim() == "-" || text.trim().is_empty() {
                    None
                } else {
                    Some(text.to_string())
                };
                session.reset();
                Effect::CommitService(draft)
            }
            None => Effect::Ignored,
        },

        Some(Step::ServiceEditValue) => match session.edit.take() {
            Some(target) => {
                session.reset();
                Effect::UpdateServiceField {
                    service_id: target.service_id,
                    field: target.field,
                    value: text.to_string(),
                }
            }
            None => Effect::Ignored,
        },

        Some(Step::Broadcast) => {
            session.reset();
            Effect::Broadcast { text: text.to_string() }
        }

        // Ожидаем кнопку (выбор услуги), а не текст — или шага нет вовсе.
        Some(Step::BookingService) | None => Effect::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(session: &mut Session, t: &str) -> Effect {
        advance(session, Event::Text(t))
    }

    #[test]
    fn booking_flow_happy_path() {
        let mut s = Session::default();
        s.start_booking();
        assert_eq!(s.step, Some(Step::BookingService));

        let eff = advance(
            &mut s,
            Event::ServiceChosen { id: 5, name: "Консультация".into() },
        );
        assert_eq!(eff, Effect::AskDate { service_name: "Консультация".into() });

        assert_eq!(text(&mut s, "15.02"), Effect::AskTime { date: "15.02".into() });
        assert_eq!(
            text(&mut s, "14:00"),
            Effect::AskBookingComment { time: "14:00".into() }
        );

        let eff = text(&mut s, "ближе к окну, пожалуйста");
        match eff {
            Effect::CommitBooking(draft) => {
                assert_eq!(draft.service_id, 5);
                assert_eq!(draft.service_name, "Консультация");
                assert_eq!(draft.date, "15.02");
                assert_eq!(draft.time, "14:00");
                assert_eq!(draft.comment.as_deref(), Some("ближе к окну, пожалуйста"));
            }
            other => panic!("expected CommitBooking, got {:?}", other),
        }
        assert!(s.is_idle());
        assert!(s.booking.is_none());
    }

    #[test]
    fn skip_comment_equals_empty_text() {
        let run = |finish: fn(&mut Session) -> Effect| {
            let mut s = Session::default();
            s.start_booking();
            advance(&mut s, Event::ServiceChosen { id: 1, name: "Стрижка".into() });
            text(&mut s, "завтра");
            text(&mut s, "после обеда");
            finish(&mut s)
        };

        let via_button = run(|s| advance(s, Event::SkipComment));
        let via_empty = run(|s| text(s, ""));

        match (via_button, via_empty) {
            (Effect::CommitBooking(a), Effect::CommitBooking(b)) => {
                assert_eq!(a.comment, None);
                assert_eq!(b.comment, None);
                assert_eq!(a, b);
            }
            other => panic!("expected two CommitBooking, got {:?}", other),
        }
    }

    #[test]
    fn cancel_resets_from_any_step() {
        let mut s = Session::default();
        s.start_booking();
        advance(&mut s, Event::ServiceChosen { id: 2, name: "Маникюр".into() });
        text(&mut s, "понедельник");

        assert_eq!(advance(&mut s, Event::Cancel), Effect::Cancelled);
        assert!(s.is_idle());
        assert!(s.booking.is_none());

        // отмена идемпотентна
        assert_eq!(advance(&mut s, Event::Cancel), Effect::Cancelled);
        assert!(s.is_idle());
    }

    #[test]
    fn step_without_draft_is_ignored() {
        // шаг указывает на дату, но черновика нет (сессию сбросила отмена,
        // а клавиатура у клиента осталась старой)
        let mut s = Session {
            step: Some(Step::BookingDate),
            ..Session::default()
        };
        assert_eq!(text(&mut s, "15.02"), Effect::Ignored);

        let mut s = Session {
            step: Some(Step::OrderAddress),
            ..Session::default()
        };
        assert_eq!(text(&mut s, "Ленина 1"), Effect::Ignored);
    }

    #[test]
    fn idle_text_is_ignored() {
        let mut s = Session::default();
        assert_eq!(text(&mut s, "привет"), Effect::Ignored);
    }

    #[test]
    fn order_flow_with_skip() {
        let mut s = Session::default();
        s.start_order();

        assert_eq!(text(&mut s, "2 пиццы"), Effect::AskAddress);
        assert_eq!(text(&mut s, "самовывоз"), Effect::AskOrderComment);

        match advance(&mut s, Event::SkipComment) {
            Effect::CommitOrder(draft) => {
                assert_eq!(draft.items, "2 пиццы");
                assert_eq!(draft.address, "самовывоз");
                assert_eq!(draft.comment, None);
            }
            other => panic!("expected CommitOrder, got {:?}", other),
        }
        assert!(s.is_idle());
    }

    #[test]
    fn request_flow_is_single_step() {
        let mut s = Session::default();
        s.start_request();

        match text(&mut s, "перезвоните мне") {
            Effect::CommitRequest { message } => assert_eq!(message, "перезвоните мне"),
            other => panic!("expected CommitRequest, got {:?}", other),
        }
        assert!(s.is_idle());
    }

    #[test]
    fn starting_new_flow_discards_other_draft() {
        let mut s = Session::default();
        s.start_order();
        text(&mut s, "букет роз");
        assert!(s.order.is_some());

        // вход в запись выбрасывает черновик заказа
        s.start_booking();
        assert!(s.order.is_none());
        assert_eq!(s.step, Some(Step::BookingService));
    }

    #[test]
    fn service_add_flow_with_price_coercion() {
        let mut s = Session::default();
        s.start_service_add();

        assert_eq!(
            text(&mut s, "Пилинг"),
            Effect::AskServicePrice { name: "Пилинг".into() }
        );
        // нечисловая цена приводится к 0, а не отклоняется
        assert_eq!(text(&mut s, "abc"), Effect::AskServiceDuration);
        // нечисловая длительность приводится к 60
        assert_eq!(text(&mut s, "долго"), Effect::AskServiceDescription);

        match text(&mut s, "-") {
            Effect::CommitService(draft) => {
                assert_eq!(draft.name, "Пилинг");
                assert_eq!(draft.price, 0);
                assert_eq!(draft.duration, 60);
                assert_eq!(draft.description, None);
            }
            other => panic!("expected CommitService, got {:?}", other),
        }
    }

    #[test]
    fn service_edit_flow() {
        let mut s = Session::default();
        let eff = advance(
            &mut s,
            Event::EditField { service_id: 3, field: ServiceField::Price },
        );
        assert_eq!(
            eff,
            Effect::AskEditValue { service_id: 3, field: ServiceField::Price }
        );

        match text(&mut s, "2500") {
            Effect::UpdateServiceField { service_id, field, value } => {
                assert_eq!(service_id, 3);
                assert_eq!(field, ServiceField::Price);
                assert_eq!(value, "2500");
            }
            other => panic!("expected UpdateServiceField, got {:?}", other),
        }
        assert!(s.is_idle());
        assert!(s.edit.is_none());
    }

    #[test]
    fn broadcast_flow() {
        let mut s = Session::default();
        s.start_broadcast();
        match text(&mut s, "Скидка 20% до пятницы!") {
            Effect::Broadcast { text } => assert_eq!(text, "Скидка 20% до пятницы!"),
            other => panic!("expected Broadcast, got {:?}", other),
        }
        assert!(s.is_idle());
    }

    #[test]
    fn numeric_coercion_policy() {
        assert_eq!(parse_price("1500"), 1500);
        assert_eq!(parse_price("  300 "), 300);
        assert_eq!(parse_price("abc"), 0);
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("-5"), 0);

        assert_eq!(parse_duration("45"), 45);
        assert_eq!(parse_duration("abc"), 60);
        assert_eq!(parse_duration("0"), 60);
        assert_eq!(parse_duration("-10"), 60);
    }
}
