//! User-facing texts sent by the conversation engine.

pub const MAIN_MENU: &str =
    "*¿Qué quieres hacer?*\n\n*1.* Descargar estado de cuenta.\n*2.* Otra solicitud";

pub const POST_DELIVERY_MENU: &str =
    "*¿Deseas realizar otra solicitud?*\n\n*1.* Sí, otra solicitud\n*2.* Terminar chat";

pub const INVALID_MAIN_OPTION: &str = "Opción no válida. Por favor, responde con 1 para descargar el estado de cuenta o 2 para otra solicitud.";

pub const INVALID_POST_DELIVERY_OPTION: &str =
    "Opción no válida. Responde con 1 para otra solicitud o 2 para terminar el chat.";

pub const REQUEST_PROMPT: &str = "Por favor, escribe tu solicitud:";

pub const REQUESTER_NAME_PROMPT: &str = "Por favor, escribe tu *nombre* para la solicitud:";

pub const LOOKUP_FAILED: &str = "No se pudo conectar con la hoja de cálculo.";

pub const NO_DATA: &str = "No se encontraron datos para tu NIT y código.";

pub const EXPORT_FAILED: &str =
    "Ocurrió un error generando o enviando tu estado de cuenta. Intenta más tarde.";

pub const STATEMENT_CAPTION: &str = "*Aquí tienes tu estado de cuenta!*";

pub const STILL_THERE: &str = "¿Estás ahí?";

pub const UNEXPECTED_FAILURE: &str = "Ocurrió un error inesperado. Intenta de nuevo más tarde.";

#[must_use]
pub fn greeting(bot_name: &str) -> String {
    format!("¡Hola! 👋 Soy *{bot_name}*.\nPor favor, digita tu número de *NIT*")
}

#[must_use]
pub fn verification_prompt(display_name: &str) -> String {
    format!("¡Hola, *{display_name}!* Por favor, ingresa tu *código de cliente*")
}

#[must_use]
pub fn primary_key_rejected(trigger: &str) -> String {
    format!("NIT no encontrado o no autorizado. Escribe {trigger} para intentarlo de nuevo.")
}

#[must_use]
pub fn verification_rejected(trigger: &str) -> String {
    format!("Código incorrecto. Escribe {trigger} para intentarlo de nuevo.")
}

#[must_use]
pub fn farewell(trigger: &str) -> String {
    format!("¡Gracias por contactarnos! Si necesitas algo más, escribe {trigger} para iniciar de nuevo.")
}

#[must_use]
pub fn restart_hint(trigger: &str) -> String {
    format!("Si necesitas algo más, escribe {trigger} para iniciar de nuevo.")
}

#[must_use]
pub fn timed_out(trigger: &str) -> String {
    format!("Chat finalizado por inactividad. Escribe {trigger} para iniciar de nuevo.")
}

/// Confirmation echoed back to the sender; the request is quoted verbatim.
#[must_use]
pub fn request_confirmation(request: &str) -> String {
    format!(
        "*¡Gracias!*\nPronto nos pondremos en contacto contigo.\n\n*Solicitud enviada:*\n```\n{request}\n```"
    )
}

/// Hand-off notice for the operator on duty.
#[must_use]
pub fn operator_notice(requester: &str, sender: &str, request: &str) -> String {
    format!(
        "*Nueva solicitud recibida*\n\n*Nombre:* {requester}\n*Número:* {sender}\n*Solicitud:*\n```\n{request}\n```"
    )
}
