use mailparse::{MailHeaderMap, ParsedMail};

/// Attachment extensions that qualify for the gallery. Matched
/// case-insensitively against the undecoded filename parameter.
pub const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// One qualifying attachment, transfer encoding already undone. The name is
/// the decoded original for display; sanitizing it for disk is the caller's
/// job.
pub struct ExtractedAttachment {
    pub original_name: String,
    pub data: Vec<u8>,
}

pub struct ExtractedMessage {
    pub sender: String,
    pub attachments: Vec<ExtractedAttachment>,
}

/// Parses a raw RFC 822 message and pulls out every image attachment. A
/// message with no qualifying parts comes back with an empty list, not an
/// error.
pub fn extract_message(raw: &[u8]) -> Result<ExtractedMessage, mailparse::MailParseError> {
    let parsed = mailparse::parse_mail(raw)?;
    let sender = parsed
        .headers
        .get_first_value("From")
        .unwrap_or_else(|| "Unknown".to_string());

    let mut attachments = Vec::new();
    collect_attachments(&parsed, &mut attachments);
    Ok(ExtractedMessage { sender, attachments })
}

fn collect_attachments(part: &ParsedMail<'_>, out: &mut Vec<ExtractedAttachment>) {
    // Containers are never attachments themselves, but everything else is a
    // candidate, and all parts get their children walked.
    if !part.ctype.mimetype.starts_with("multipart/") {
        push_if_image(part, out);
    }
    for sub in &part.subparts {
        collect_attachments(sub, out);
    }
}

fn push_if_image(part: &ParsedMail<'_>, out: &mut Vec<ExtractedAttachment>) {
    // Phone clients routinely send photos disposed `inline` rather than
    // `attachment`, so any explicit Content-Disposition header qualifies.
    // Only parts with no disposition header at all are passed over. The
    // parsed type cannot express that distinction since an absent header
    // also parses as inline.
    if part.headers.get_first_value("Content-Disposition").is_none() {
        return;
    }
    let disposition = part.get_content_disposition();
    let Some(raw_name) = disposition.params.get("filename") else {
        return;
    };
    if !has_image_extension(raw_name) {
        return;
    }

    match part.get_body_raw() {
        Ok(data) if !data.is_empty() => out.push(ExtractedAttachment {
            original_name: decode_rfc2047(raw_name),
            data,
        }),
        Ok(_) => {}
        Err(err) => {
            tracing::debug!("Skipping undecodable attachment {:?}: {}", raw_name, err);
        }
    }
}

pub fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Filename parameters occasionally arrive RFC 2047 encoded even though the
/// standard reserves that for headers. Round-tripping through a synthetic
/// header decodes them; plain names pass through untouched.
fn decode_rfc2047(input: &str) -> String {
    let fake_header = format!("X: {}", input);
    match mailparse::parse_header(fake_header.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => input.to_string(),
    }
}
