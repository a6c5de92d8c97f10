//! Raw RFC 822 messages via `mailparse`.

use mailparse::{addrparse_header, DispositionType, MailAddr, MailHeader, MailHeaderMap, ParsedMail};

use super::{BodyKind, FieldValue, MailMessage, MimeEntity};

impl MimeEntity for ParsedMail<'_> {
    fn content_type(&self) -> Option<&str> {
        Some(&self.ctype.mimetype)
    }

    fn decoded(&self) -> Option<String> {
        if self.subparts.is_empty() {
            self.get_body().ok()
        } else {
            None
        }
    }

    fn body(&self) -> Option<&dyn MimeEntity> {
        match self.subparts.as_slice() {
            [only] => Some(only as &dyn MimeEntity),
            _ => None,
        }
    }
}

impl MailMessage for ParsedMail<'_> {
    fn to(&self) -> FieldValue {
        address_field(&self.headers, "To")
    }

    fn from(&self) -> FieldValue {
        address_field(&self.headers, "From")
    }

    fn subject(&self) -> FieldValue {
        self.headers.get_first_value("Subject").into()
    }

    fn html_part(&self) -> Option<&dyn MimeEntity> {
        find_leaf(self, BodyKind::Html).map(|part| part as &dyn MimeEntity)
    }

    fn text_part(&self) -> Option<&dyn MimeEntity> {
        find_leaf(self, BodyKind::Text).map(|part| part as &dyn MimeEntity)
    }
}

/// Depth-first search for the first inline leaf part of the given kind below the root.
///
/// Attachments never count as the message body.
fn find_leaf<'m, 'a>(mail: &'m ParsedMail<'a>, kind: BodyKind) -> Option<&'m ParsedMail<'a>> {
    mail.subparts.iter().find_map(|part| {
        if part.subparts.is_empty() {
            let attached = matches!(
                part.get_content_disposition().disposition,
                DispositionType::Attachment
            );
            (!attached && kind.matches(&part.ctype.mimetype)).then_some(part)
        } else {
            find_leaf(part, kind)
        }
    })
}

/// Collect every mailbox of every occurrence of an address header.
///
/// Groups are flattened. A header that does not parse as an address list is
/// kept as its raw value so the extractor can still trim and use it.
fn address_field(headers: &[MailHeader<'_>], name: &str) -> FieldValue {
    let mut addresses = Vec::new();

    for header in headers.get_all_headers(name) {
        match addrparse_header(header) {
            Ok(list) => {
                for addr in list.iter() {
                    match addr {
                        MailAddr::Single(info) => addresses.push(info.addr.clone()),
                        MailAddr::Group(group) => {
                            addresses.extend(group.addrs.iter().map(|info| info.addr.clone()))
                        }
                    }
                }
            }
            Err(_) => addresses.push(header.get_value()),
        }
    }

    if addresses.is_empty() {
        FieldValue::Absent
    } else {
        FieldValue::Many(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &str = concat!(
        "From: Sender <sender@example.com>\r\n",
        "To: first@example.com, Second <second@example.com>\r\n",
        "Subject: Welcome\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/alternative; boundary=\"b1\"\r\n",
        "\r\n",
        "--b1\r\n",
        "Content-Type: text/plain; charset=UTF-8\r\n",
        "\r\n",
        "Hi there\r\n",
        "--b1\r\n",
        "Content-Type: text/html; charset=UTF-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p class=3D\"greeting\">Hi there</p>\r\n",
        "--b1--\r\n",
    );

    #[test]
    fn test_addresses_are_parsed_from_headers() {
        let mail = mailparse::parse_mail(MULTIPART.as_bytes()).unwrap();

        assert_eq!(
            mail.to(),
            FieldValue::Many(vec!["first@example.com".into(), "second@example.com".into()])
        );
        assert_eq!(mail.from(), FieldValue::Many(vec!["sender@example.com".into()]));
        assert_eq!(mail.subject(), FieldValue::One("Welcome".into()));
    }

    #[test]
    fn test_named_parts_are_decoded() {
        let mail = mailparse::parse_mail(MULTIPART.as_bytes()).unwrap();

        let html = mail.html_part().unwrap().decoded().unwrap();
        assert!(html.contains("<p class=\"greeting\">Hi there</p>"));

        let text = mail.text_part().unwrap().decoded().unwrap();
        assert!(text.starts_with("Hi there"));
    }

    #[test]
    fn test_single_part_message_exposes_own_content_type() {
        let raw = concat!(
            "From: sender@example.com\r\n",
            "To: user@example.com\r\n",
            "Subject: Plain\r\n",
            "Content-Type: text/html; charset=UTF-8\r\n",
            "\r\n",
            "<p>Only</p>\r\n",
        );
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        assert!(mail.html_part().is_none());
        assert_eq!(mail.content_type(), Some("text/html"));
        assert!(mail.decoded().unwrap().contains("<p>Only</p>"));
    }

    #[test]
    fn test_attachments_are_not_named_parts() {
        let raw = concat!(
            "From: sender@example.com\r\n",
            "To: user@example.com\r\n",
            "Subject: Report\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"m1\"\r\n",
            "\r\n",
            "--m1\r\n",
            "Content-Type: text/plain; charset=UTF-8\r\n",
            "\r\n",
            "See attached\r\n",
            "--m1\r\n",
            "Content-Type: text/html; charset=UTF-8\r\n",
            "Content-Disposition: attachment; filename=\"report.html\"\r\n",
            "\r\n",
            "<h1>Attached report</h1>\r\n",
            "--m1--\r\n",
        );
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        assert!(mail.html_part().is_none());
        assert!(mail.text_part().unwrap().decoded().unwrap().starts_with("See attached"));
    }

    #[test]
    fn test_missing_address_header_is_absent() {
        let raw = "Subject: Nobody\r\n\r\nbody\r\n";
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        assert!(mail.to().is_absent());
        assert!(mail.from().is_absent());
    }
}
