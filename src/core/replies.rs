//! User-facing reply texts (Spanish, as the bot's users write)

use crate::models::types::{ParsedExpense, RejectionKind, Reply};
use crate::utils::text::{capitalize, escape_html, format_amount};

pub fn start(first_name: &str) -> Reply {
    Reply::html(format!(
        "¡Hola {}!\n\n\
         Estoy listo para registrar tus gastos. Tienes 2 opciones:\n\n\
         <b>1. Formato estándar:</b>\n\
         <code>gasto [monto] [categoria]</code>\n\n\
         <b>2. Atajo (shortcut):</b>\n\
         <code>[categoria] [monto]</code>\n\n\
         Puedes añadir una descripción entre comillas simples, por ejemplo:\n\
         <code>gasto 5 cafe 'con amigos'</code>\n\n\
         Usa /categorias para ver la lista de categorías válidas.",
        escape_html(first_name)
    ))
}

pub fn categories(display_names: &[String]) -> Reply {
    if display_names.is_empty() {
        return Reply::plain("Aún no se han configurado categorías.");
    }

    let list: Vec<String> = display_names.iter().map(|n| escape_html(n)).collect();
    Reply::html(format!(
        "<b>Estas son tus categorías válidas:</b>\n\n{}",
        list.join("\n")
    ))
}

pub fn recorded(expense: &ParsedExpense, sheet_name: &str) -> Reply {
    let mut text = format!(
        "✅ ¡Registrado en '{}'!\nMonto: ${}\nCategoría: {}",
        sheet_name,
        format_amount(expense.amount),
        expense.category
    );
    if expense.has_description() {
        text.push_str(&format!("\nDescripción: {}", expense.description));
    }
    Reply::plain(text)
}

pub fn rejection(kind: &RejectionKind) -> Reply {
    match kind {
        RejectionKind::MalformedShortcut { category } => Reply::html(format!(
            "Formato de atajo incorrecto para <b>{}</b>. 😕\n\
             Intenta con: <code>[categoria] [monto]</code>",
            escape_html(&capitalize(category))
        )),
        RejectionKind::MalformedExpense => Reply::plain(
            "Formato incorrecto. 😕\nIntenta con: gasto [monto] [categoria]",
        ),
        RejectionKind::InvalidAmount { token } => {
            Reply::plain(format!("El monto '{}' no es un número válido. 😕", token))
        }
        RejectionKind::NonPositiveAmount { token } => Reply::plain(format!(
            "El monto '{}' debe ser mayor que cero. 😕",
            token
        )),
    }
}

pub fn unrecognized() -> Reply {
    Reply::html("No entendí ese comando. 🤷\nUsa /start para ver las opciones.")
}

pub fn sink_failure() -> Reply {
    Reply::plain("¡Ups! Error al guardar en Google Sheets.")
}
