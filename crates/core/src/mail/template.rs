use crate::mail::ChangeNotification;

pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

fn symbols(list: &[String]) -> String {
    format!("[{}]", list.join(" "))
}

pub fn render_change_email(notification: &ChangeNotification) -> RenderedEmail {
    let name = &notification.list_name;
    RenderedEmail {
        subject: format!("{name} changed!"),
        body: format!(
            "Recommendations in your {name} profile has changed.\n\n\
             Removed stocks: {}\n\
             Added stocks: {}\n\n\
             Currently recommended stocks: {}",
            symbols(&notification.removed),
            symbols(&notification.added),
            symbols(&notification.current),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_lists() {
        let email = render_change_email(&ChangeNotification {
            list_name: "dividends".to_string(),
            removed: vec!["INTC".to_string()],
            added: vec![],
            current: vec!["T".to_string(), "KO".to_string()],
            recipient: "alice@example.com".to_string(),
        });

        assert_eq!(email.subject, "dividends changed!");
        assert!(email.body.contains("Removed stocks: [INTC]\n"));
        assert!(email.body.contains("Added stocks: []\n"));
        assert!(email.body.ends_with("Currently recommended stocks: [T KO]"));
    }
}
