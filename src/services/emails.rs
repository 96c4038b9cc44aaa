use html_escape::encode_text;

use crate::models::booking::Booking;
use crate::services::mailer::OutgoingEmail;

/// Contact form submission after validation
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

/// Formats minor units as `25,000.00`
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let minor_units = minor_units.unsigned_abs();
    let whole = (minor_units / 100).to_string();
    let fraction = minor_units % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", sign, grouped, fraction)
}

pub fn booking_confirmation(booking: &Booking, base_url: &str) -> OutgoingEmail {
    let passengers_html: String = booking
        .passengers
        .0
        .iter()
        .map(|p| {
            format!(
                r#"<tr><td style="padding: 6px 12px;">{}</td><td style="padding: 6px 12px;">{}</td></tr>"#,
                encode_text(&p.name),
                encode_text(p.seat_number.as_deref().unwrap_or("-")),
            )
        })
        .collect();

    let receipt_url = format!(
        "{}/bookings/{}/receipt",
        base_url.trim_end_matches('/'),
        booking.reference
    );

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Booking confirmation</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #1E3A5F;">Your trip is booked</h2>
        <p>Hello {name},</p>
        <p>Thank you for booking with Coachline. Your booking reference is <strong>{reference}</strong>.</p>
        <table style="border-collapse: collapse; margin: 20px 0;">
            <tr><td style="padding: 6px 12px; font-weight: bold;">Route</td><td style="padding: 6px 12px;">{origin} &rarr; {destination}</td></tr>
            <tr><td style="padding: 6px 12px; font-weight: bold;">Date</td><td style="padding: 6px 12px;">{date}</td></tr>
            <tr><td style="padding: 6px 12px; font-weight: bold;">Departure</td><td style="padding: 6px 12px;">{departure}</td></tr>
            <tr><td style="padding: 6px 12px; font-weight: bold;">Amount</td><td style="padding: 6px 12px;">{amount}</td></tr>
            <tr><td style="padding: 6px 12px; font-weight: bold;">Status</td><td style="padding: 6px 12px;">{status}</td></tr>
        </table>
        <h3 style="color: #1E3A5F;">Passengers</h3>
        <table style="border-collapse: collapse;">
            <tr><th style="padding: 6px 12px; text-align: left;">Name</th><th style="padding: 6px 12px; text-align: left;">Seat</th></tr>
            {passengers}
        </table>
        <p style="margin: 30px 0;">
            <a href="{receipt_url}"
               style="display: inline-block; background-color: #1E3A5F; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">
                View receipt
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">Please arrive at the terminal 30 minutes before departure.</p>
    </div>
</body>
</html>"#,
        name = encode_text(&booking.contact_name),
        reference = encode_text(&booking.reference),
        origin = encode_text(&booking.origin),
        destination = encode_text(&booking.destination),
        date = booking.travel_date.format("%A, %d %B %Y"),
        departure = encode_text(booking.departure_time.as_deref().unwrap_or("See terminal schedule")),
        amount = format_amount(booking.amount),
        status = encode_text(&booking.status),
        passengers = passengers_html,
        receipt_url = receipt_url,
    );

    OutgoingEmail {
        to: booking.contact_email.clone(),
        reply_to: None,
        subject: format!("Booking confirmation {}", booking.reference),
        html_body,
    }
}

pub fn contact_message(message: &ContactMessage, inbox: &str) -> OutgoingEmail {
    let subject = message
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("New contact message");

    // Keep line breaks from the form
    let body_html = encode_text(&message.message).replace('\n', "<br>");

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Contact message</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #1E3A5F;">{subject}</h2>
        <p><strong>From:</strong> {name} &lt;{email}&gt;</p>
        <div style="background: #F5F3ED; padding: 16px; border-left: 4px solid #1E3A5F;">{body}</div>
    </div>
</body>
</html>"#,
        subject = encode_text(subject),
        name = encode_text(&message.name),
        email = encode_text(&message.email),
        body = body_html,
    );

    OutgoingEmail {
        to: inbox.to_string(),
        reply_to: Some(message.email.clone()),
        subject: format!("[Contact] {}", subject),
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::tests::sample_booking;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(123_456), "1,234.56");
        assert_eq!(format_amount(2_500_000), "25,000.00");
        assert_eq!(format_amount(100_000_000), "1,000,000.00");
        assert_eq!(format_amount(-150), "-1.50");
    }

    #[test]
    fn test_booking_confirmation_content() {
        let booking = sample_booking();
        let email = booking_confirmation(&booking, "https://coachline.example/");

        assert_eq!(email.to, "ada.obi@example.com");
        assert_eq!(email.subject, "Booking confirmation CL-7K3QX9PD");
        assert!(email.html_body.contains("Lagos &rarr; Abuja"));
        assert!(email.html_body.contains("25,000.00"));
        assert!(email.html_body.contains("Chidi Obi"));
        assert!(email
            .html_body
            .contains("https://coachline.example/bookings/CL-7K3QX9PD/receipt"));
    }

    #[test]
    fn test_contact_message_escapes_user_input() {
        let message = ContactMessage {
            name: "<script>alert(1)</script>".to_string(),
            email: "eve@example.com".to_string(),
            subject: Some("  ".to_string()),
            message: "line one\n<b>line two</b>".to_string(),
        };

        let email = contact_message(&message, "support@coachline.local");

        assert_eq!(email.to, "support@coachline.local");
        assert_eq!(email.reply_to.as_deref(), Some("eve@example.com"));
        assert_eq!(email.subject, "[Contact] New contact message");
        assert!(!email.html_body.contains("<script>"));
        assert!(email.html_body.contains("&lt;script&gt;"));
        assert!(email.html_body.contains("line one<br>&lt;b&gt;line two&lt;/b&gt;"));
    }
}
