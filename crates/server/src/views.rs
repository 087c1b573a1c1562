//! Hand-rendered HTML pages. The whole surface is a handful of forms and a
//! gallery grid, so pages are assembled as strings around one shared layout
//! instead of pulling in a template engine.

use axum::http::StatusCode;
use axum::response::Html;
use db::models::{event::Event, image::Image};
use services::services::config::AddressConfig;

/// A stored event plus its derived collection address. The address is a pure
/// function of the key and is never persisted.
pub struct EventView {
    pub event: Event,
    pub address: String,
}

impl EventView {
    pub fn new(event: Event, addresses: &AddressConfig) -> EventView {
        let address = addresses.collection_address(&event.key);
        EventView { event, address }
    }
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#fafafa;color:#222}\
header{background:#2b5e8c;padding:0.75rem 1.25rem}\
header a{color:#fff;text-decoration:none;font-weight:700;font-size:1.2rem}\
main{max-width:60rem;margin:1.5rem auto;padding:0 1rem}\
.flash{background:#fff3cd;border:1px solid #e0c36b;border-radius:4px;padding:0.5rem 0.75rem;margin:0.5rem 0}\
.address{font-family:monospace;background:#eef3f7;padding:0.2rem 0.4rem;border-radius:3px}\
.gallery{display:grid;grid-template-columns:repeat(auto-fill,minmax(14rem,1fr));gap:1rem;padding:0;list-style:none}\
.gallery img{width:100%;height:12rem;object-fit:cover;border-radius:4px}\
.gallery figcaption{font-size:0.85rem;color:#555}\
form{margin:1rem 0}\
label{display:block;margin:0.5rem 0 0.2rem}\
input[type=text],input[type=password],textarea{width:100%;max-width:28rem;padding:0.4rem}\
button{background:#2b5e8c;color:#fff;border:0;border-radius:4px;padding:0.45rem 0.9rem;cursor:pointer}\
button.danger{background:#a33}\
table{border-collapse:collapse;width:100%}\
td,th{border-bottom:1px solid #ddd;padding:0.4rem 0.5rem;text-align:left}";

fn layout(title: &str, flashes: &[String], body: &str) -> Html<String> {
    let mut flash_html = String::new();
    for flash in flashes {
        flash_html.push_str(&format!("<div class=\"flash\">{}</div>", escape(flash)));
    }
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} - mailpix</title>\n<style>{}</style>\n</head>\n<body>\n\
         <header><a href=\"/\">mailpix</a></header>\n<main>\n{}{}\n</main>\n</body>\n</html>\n",
        escape(title),
        STYLE,
        flash_html,
        body
    ))
}

pub fn index_page(flashes: &[String]) -> Html<String> {
    layout(
        "Home",
        flashes,
        "<h2>Shared photo galleries, by email</h2>\
         <p>Create an event and you get a collection email address. Anyone who \
         emails photos to that address sees them appear in the event's gallery.</p>\
         <p><a href=\"/create_event\"><button>Create an event</button></a> \
         <a href=\"/find_event\"><button>Find an event</button></a></p>",
    )
}

pub fn create_event_page(flashes: &[String]) -> Html<String> {
    layout(
        "Create event",
        flashes,
        "<h2>Create an event</h2>\
         <form method=\"post\" action=\"/create_event\">\
         <label for=\"name\">Event name</label>\
         <input type=\"text\" id=\"name\" name=\"name\">\
         <label for=\"description\">Description (optional)</label>\
         <textarea id=\"description\" name=\"description\" rows=\"3\"></textarea>\
         <label for=\"admin_password\">Admin password</label>\
         <input type=\"password\" id=\"admin_password\" name=\"admin_password\">\
         <p><button type=\"submit\">Create</button></p>\
         </form>",
    )
}

pub fn find_event_page(flashes: &[String]) -> Html<String> {
    layout(
        "Find event",
        flashes,
        "<h2>Find an event</h2>\
         <p>Paste the event's collection email address.</p>\
         <form method=\"post\" action=\"/find_event\">\
         <label for=\"email\">Event email</label>\
         <input type=\"text\" id=\"email\" name=\"email\" placeholder=\"mailpix+key@gmail.com\">\
         <p><button type=\"submit\">Find</button></p>\
         </form>",
    )
}

fn gallery_html(images: &[Image]) -> String {
    if images.is_empty() {
        return "<p>No photos yet. Email some!</p>".to_string();
    }
    let mut out = String::from("<ul class=\"gallery\">");
    for image in images {
        let file = escape(&image.file_name);
        out.push_str(&format!(
            "<li><figure><a href=\"/uploads/{file}\">\
             <img src=\"/uploads/{file}\" alt=\"{alt}\" loading=\"lazy\"></a>\
             <figcaption>{original}<br><small>from {sender}, {received}</small>\
             </figcaption></figure></li>",
            file = file,
            alt = escape(&image.original_name),
            original = escape(&image.original_name),
            sender = escape(&image.sender),
            received = image.received_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out.push_str("</ul>");
    out
}

pub fn event_page(flashes: &[String], view: &EventView, images: &[Image]) -> Html<String> {
    let description = view
        .event
        .description
        .as_deref()
        .map(|d| format!("<p>{}</p>", escape(d)))
        .unwrap_or_default();
    let body = format!(
        "<h2>{name}</h2>{description}\
         <p>Email photos to <span class=\"address\">{address}</span> and they \
         will show up here.</p>\
         <p><a href=\"/event/{key}\"><button>Check for new photos</button></a></p>\
         {gallery}",
        name = escape(&view.event.name),
        description = description,
        address = escape(&view.address),
        key = escape(&view.event.key),
        gallery = gallery_html(images),
    );
    layout(&view.event.name, flashes, &body)
}

pub fn admin_login_page(flashes: &[String]) -> Html<String> {
    layout(
        "Admin login",
        flashes,
        "<h2>Admin login</h2>\
         <form method=\"post\" action=\"/admin/login\">\
         <label for=\"password\">Master password</label>\
         <input type=\"password\" id=\"password\" name=\"password\">\
         <p><button type=\"submit\">Log in</button></p>\
         </form>",
    )
}

pub fn admin_dashboard_page(flashes: &[String], rows: &[(EventView, i64)]) -> Html<String> {
    let mut table = String::from(
        "<table><tr><th>Event</th><th>Address</th><th>Images</th>\
         <th>Created</th><th></th></tr>",
    );
    for (view, image_count) in rows {
        table.push_str(&format!(
            "<tr><td><a href=\"/admin/event/{id}\">{name}</a></td>\
             <td><span class=\"address\">{address}</span></td>\
             <td>{count}</td><td>{created}</td>\
             <td><a href=\"/event/{key}\">public page</a></td></tr>",
            id = view.event.id,
            name = escape(&view.event.name),
            address = escape(&view.address),
            count = image_count,
            created = view.event.created_at.format("%Y-%m-%d %H:%M"),
            key = escape(&view.event.key),
        ));
    }
    table.push_str("</table>");

    let body = format!(
        "<h2>Admin</h2>\
         <form method=\"post\" action=\"/admin/refresh\" style=\"display:inline\">\
         <button type=\"submit\">Refresh all events</button></form> \
         <form method=\"post\" action=\"/admin/logout\" style=\"display:inline\">\
         <button type=\"submit\">Log out</button></form>\
         {table}",
        table = table,
    );
    layout("Admin", flashes, &body)
}

pub fn admin_event_page(flashes: &[String], view: &EventView, images: &[Image]) -> Html<String> {
    let mut items = String::new();
    if images.is_empty() {
        items.push_str("<p>No images.</p>");
    } else {
        items.push_str("<ul class=\"gallery\">");
        for image in images {
            items.push_str(&format!(
                "<li><figure><a href=\"/uploads/{file}\">\
                 <img src=\"/uploads/{file}\" alt=\"{alt}\" loading=\"lazy\"></a>\
                 <figcaption>{original}<br><small>from {sender}, {received}</small>\
                 <form method=\"post\" action=\"/admin/image/{id}/delete\">\
                 <button class=\"danger\" type=\"submit\">Delete image</button>\
                 </form></figcaption></figure></li>",
                file = escape(&image.file_name),
                alt = escape(&image.original_name),
                original = escape(&image.original_name),
                sender = escape(&image.sender),
                received = image.received_at.format("%Y-%m-%d %H:%M"),
                id = image.id,
            ));
        }
        items.push_str("</ul>");
    }

    let body = format!(
        "<h2>{name}</h2>\
         <p><span class=\"address\">{address}</span> \
         &middot; <a href=\"/event/{key}\">public page</a> \
         &middot; <a href=\"/admin\">back to dashboard</a></p>\
         <form method=\"post\" action=\"/admin/event/{id}/refresh\" style=\"display:inline\">\
         <button type=\"submit\">Refresh</button></form> \
         <form method=\"post\" action=\"/admin/event/{id}/delete\" style=\"display:inline\">\
         <button class=\"danger\" type=\"submit\">Delete event</button></form>\
         {items}",
        name = escape(&view.event.name),
        address = escape(&view.address),
        key = escape(&view.event.key),
        id = view.event.id,
        items = items,
    );
    layout(&view.event.name, flashes, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!("<h2>{}</h2><p>{}</p>", escape(&title), escape(message));
    layout(&title, &[], &body)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn addresses() -> AddressConfig {
        AddressConfig {
            prefix: "mailpix+".to_string(),
            domain: "gmail.com".to_string(),
        }
    }

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "Nina & Tom <wedding>".to_string(),
            description: Some("Reception hall".to_string()),
            key: "aB3xYz9".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<img src=x onerror=\"alert('x')\">"),
            "&lt;img src=x onerror=&quot;alert(&#39;x&#39;)&quot;&gt;"
        );
        assert_eq!(escape("a&b"), "a&amp;b");
    }

    #[test]
    fn event_page_escapes_name_and_shows_address() {
        let view = EventView::new(sample_event(), &addresses());
        let Html(html) = event_page(&[], &view, &[]);

        assert!(html.contains("Nina &amp; Tom &lt;wedding&gt;"));
        assert!(html.contains("mailpix+aB3xYz9@gmail.com"));
        assert!(!html.contains("<wedding>"));
    }

    #[test]
    fn gallery_links_images_under_uploads() {
        let view = EventView::new(sample_event(), &addresses());
        let image = Image {
            id: Uuid::new_v4(),
            file_name: "20250601120000_00c0ffee_party.jpg".to_string(),
            original_name: "party.jpg".to_string(),
            sender: "alice@example.com".to_string(),
            received_at: Utc::now(),
            event_id: view.event.id,
        };
        let Html(html) = event_page(&[], &view, std::slice::from_ref(&image));

        assert!(html.contains("/uploads/20250601120000_00c0ffee_party.jpg"));
        assert!(html.contains("alice@example.com"));
    }

    #[test]
    fn flashes_render_in_layout() {
        let Html(html) = index_page(&["Event not found".to_string()]);
        assert!(html.contains("class=\"flash\""));
        assert!(html.contains("Event not found"));
    }
}
