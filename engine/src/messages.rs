//! Reply templates for the configured locale.

use chrono::NaiveDate;
use chrono_tz::Tz;
use govdesk_core::directory::{Price, ServiceDetails, UpcomingAppointment};

use crate::semantic::ScoredService;

pub const REPEAT_WHAT: &str = "تمام، شو بدك أعيد بالضبط؟";
pub const GENERIC_FALLBACK: &str = "معلش، ما فهمتك تمام. احكيلي شو حابب أساعدك فيه.";
pub const COLLABORATOR_APOLOGY: &str = "معلش، صار عندي مشكلة تقنية هلأ. جرب كمان شوي.";
pub const INTERNAL_FAILURE: &str = "معلش، صار خطأ غير متوقع. خلينا نحاول مرة ثانية.";

pub const WHICH_SERVICE_SHORT: &str = "تمام، أي خدمة بدك نحجزها؟";
pub const WHICH_SERVICE: &str = "تمام. احكيلي أي خدمة بدك تحجز؟";
pub const SERVICE_NOT_FOUND: &str = "معلش، ما قدرت أحدد الخدمة. ممكن تحكيلي اسمها بطريقة ثانية؟";
pub const DUPLICATE_BOOKING: &str = "لديك موعد قادم لهذه الخدمة بالفعل، لا يمكنك الحجز مرة أخرى.";
pub const CLARIFY_ANY: &str = "ممكن توضّح لي أي خدمة تقصد؟";

pub const INQUIRY_TYPE_RETRY: &str = "احكيلي لو سمحتي: بدك تعرف السعر ولا المستندات المطلوبة؟";
pub const INQUIRY_TYPE_GUARD: &str = "إذا بدك نكمل، بدك تعرف السعر ولا المستندات المطلوبة؟";
pub const BOOKING_CONFIRM_GUARD: &str = "بدك أحجزلك موعد؟ (نعم/لا)";
pub const NO_MORE_QUESTIONS: &str = "تمام، إذا بدك أي استفسار ثاني احكيلي.";
pub const SERVICE_INFO_FAILED: &str = "صار في مشكلة وأنا بجيب معلومات الخدمة.";

pub const VERIFY_TO_BOOK: &str = "عشان نحجز موعد، بدنا نتحقق من هويتك. احكيلي رقم هويتك.";
pub const VERIFY_TO_MODIFY: &str = "عشان نعدّل موعدك، بدنا نتحقق من هويتك. احكيلي رقم هويتك.";
pub const VERIFY_TO_CANCEL: &str = "عشان نلغي الموعد، بدنا نتحقق من هويتك. احكيلي رقم هويتك.";
pub const INVALID_NATIONAL_ID: &str = "رقم الهوية غير صحيح. احكيلي رقم هوية صحيح.";
pub const ASK_PHONE: &str = "تمام. احكيلي رقم تلفونك.";
pub const INVALID_PHONE: &str = "رقم التلفون غير صحيح. احكيلي رقم تلفون صحيح.";
pub const OTP_SENT: &str = "بعتلك رمز تحقق برسالة، احكيلي الرمز.";
pub const WRONG_OTP: &str = "رمز غير صحيح. جرب مرة ثانية.";
pub const HOW_CAN_I_HELP: &str = "تمام. كيف بقدر أساعدك؟";

pub const ASK_TIME: &str = "تمام بأي ساعة حابب الموعد؟";
pub const TIME_RETRY: &str = "احكيلي الساعة لو سمحتي. مثال: 10:30.";
pub const CONFIRM_RETRY: &str = "معلش، بس للتأكيد: هل الموعد مناسب؟ احكي نعم أو لا.";
pub const DATE_AGAIN: &str = "تمام، خلينا نغيّر الموعد.\nاحكيلي تاريخ جديد: اليوم والشهر.";
pub const BOOKING_DONE: &str = "تمام تم حجز الموعد بنجاح.";
pub const BOOKING_INCOMPLETE: &str = "صار في نقص بالمعلومات، خلينا نعيد المحاولة.";
pub const PAST_DATE: &str = "هذا التاريخ صار ماضي. احكيلي تاريخ قادم: اليوم والشهر.";
pub const PAST_TIME: &str = "هذا الوقت صار ماضي. احكيلي ساعة ثانية.";
pub const PAST_AT_CONFIRM: &str = "الموعد صار بالماضي. خلينا نختار تاريخ جديد: اليوم والشهر.";

pub const NO_UPCOMING: &str = "ما عندك أي مواعيد قادمة.";
pub const APPOINTMENT_NOT_MATCHED: &str = "ما قدرت أحدد أي موعد. احكيلي رقم الموعد من القائمة.";
pub const ASK_NEW_DATE: &str = "تمام. احكيلي التاريخ الجديد.";
pub const NEW_DATE_UNCLEAR: &str = "مش واضح التاريخ. احكيلي اليوم والشهر، مثلاً: 28/12";
pub const ASK_NEW_TIME: &str = "تمام. احكيلي الساعة الجديدة.";
pub const NEW_TIME_UNCLEAR: &str = "مش واضحة الساعة. احكيلي الساعة مثل: 11:30";
pub const MODIFY_FAILED: &str = "صار في مشكلة بتعديل الموعد. جرب لاحقًا.";

pub const CANCEL_RETRY: &str = "بس للتأكيد، بدك تلغي الموعد؟ نعم أو لا.";
pub const CANCEL_KEPT: &str = "تمام، ما لغينا الموعد.";
pub const CANCEL_DONE: &str = "تم إلغاء الموعد بنجاح.";
pub const CANCEL_FAILED: &str = "صار في مشكلة بإلغاء الموعد. جرب لاحقًا.";

pub const HAS_PREVIOUS_ID: &str = "هل كان عندك هوية من قبل؟ نعم أو لا";
pub const HAS_PREVIOUS_ID_RETRY: &str = "بس للتأكيد، هل كان عندك هوية من قبل؟ نعم أو لا.";
pub const ASK_ISSUANCE_REASON: &str = "تمام. شو السبب؟\nضاعت الهوية؟ تالفة؟ ولا بدك تعديل بيانات؟";
pub const ISSUANCE_REASON_RETRY: &str = "بس للتأكيد، شو السبب؟ ضاعت، تالفة، ولا تعديل بيانات؟";

pub fn ask_date(service_name: &str) -> String {
    format!("تمام بدنا نحجز موعد لخدمة \"{service_name}\".\nاحكيلي تاريخ الموعد: اليوم والشهر.")
}

pub fn ask_inquiry_type(service_name: &str) -> String {
    format!("خدمة \"{service_name}\".\nبدك تعرف السعر ولا المستندات المطلوبة؟")
}

pub fn issuance_service_chosen(service_name: &str) -> String {
    format!("تمام. خدمة {service_name}.\nبدك تعرف السعر ولا المستندات المطلوبة؟")
}

pub fn interrupted_at_date(service_name: &str) -> String {
    format!("تمام، احكيلي شو بدك تستفسر عنه بخصوص خدمة \"{service_name}\".")
}

pub fn interrupted_at_time(service_name: &str) -> String {
    format!("تمام، احكيلي شو حابب تعرف عن خدمة \"{service_name}\".")
}

pub fn interrupted_at_confirm(service_name: &str) -> String {
    format!("تمام، تفضل اسألني عن خدمة \"{service_name}\".")
}

pub fn confirm_booking(service_name: &str, date: NaiveDate, display_time: &str) -> String {
    format!(
        "تمام. موعدك لخدمة \"{service_name}\"\nبتاريخ {}\nالساعة {display_time}.\nهل هيك مناسب؟",
        display_date(date)
    )
}

pub fn price_answer(details: &ServiceDetails) -> String {
    let price = match &details.price {
        Some(price) if !is_zero(price) => {
            let currency = details.currency.as_deref().unwrap_or_default();
            format!("رسوم الخدمة {price} {currency}").trim_end().to_string()
        }
        _ => "الخدمة مجانية".to_string(),
    };
    format!("{price}.\nبدك أحجزلك موعد؟")
}

fn is_zero(price: &Price) -> bool {
    match price {
        Price::Number(value) => *value == 0.0,
        Price::Text(text) => text.trim().parse::<f64>().is_ok_and(|v| v == 0.0),
    }
}

pub fn documents_answer(details: &ServiceDetails) -> String {
    let documents = if details.documents.is_empty() {
        "ما في مستندات مطلوبة.".to_string()
    } else {
        details
            .documents
            .iter()
            .map(|d| d.voice_text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!("{documents}\nبدك أحجزلك موعد لهاي الخدمة؟")
}

pub fn clarify_services(alternatives: &[ScoredService]) -> String {
    if alternatives.is_empty() {
        return CLARIFY_ANY.to_string();
    }
    let options = alternatives
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s.canonical_name))
        .collect::<Vec<_>>()
        .join("\n");
    format!("ممكن توضّح قصدك أكثر؟\nأي خدمة من هدول تقصد:\n\n{options}")
}

pub fn single_appointment_to_modify(appointment: &UpcomingAppointment, tz: Tz) -> String {
    format!(
        "تمام. موعدك لخدمة \"{}\" بتاريخ {}.\nاحكيلي التاريخ الجديد.",
        appointment.service.canonical_name,
        appointment_date(appointment, tz)
    )
}

pub fn choose_appointment_to_modify(appointments: &[UpcomingAppointment], tz: Tz) -> String {
    format!(
        "أي موعد بدك تعدله؟\nاحكيلي رقم الموعد من القائمة:\n\n{}",
        appointment_list(appointments, tz)
    )
}

pub fn choose_appointment_to_cancel(appointments: &[UpcomingAppointment], tz: Tz) -> String {
    format!(
        "أي موعد بدك تلغيه؟\nاحكيلي رقم الموعد من القائمة:\n\n{}",
        appointment_list(appointments, tz)
    )
}

pub fn confirm_cancel(appointment: &UpcomingAppointment, tz: Tz) -> String {
    format!(
        "هل أنت متأكد إنك بدك تلغي موعد:\n\"{}\" بتاريخ {}؟\n(نعم / لا)",
        appointment.service.canonical_name,
        appointment_date(appointment, tz)
    )
}

pub fn appointment_modified(date: NaiveDate, display_time: &str) -> String {
    format!(
        "تم تعديل الموعد بنجاح.\nالموعد الجديد بتاريخ {} الساعة {display_time}",
        display_date(date)
    )
}

fn appointment_list(appointments: &[UpcomingAppointment], tz: Tz) -> String {
    appointments
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "{}. {} بتاريخ {}",
                i + 1,
                a.service.canonical_name,
                appointment_date(a, tz)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn appointment_date(appointment: &UpcomingAppointment, tz: Tz) -> String {
    display_date(appointment.appointment_date.with_timezone(&tz).date_naive())
}

/// `d/m/yyyy`, the way dates are read out.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}
