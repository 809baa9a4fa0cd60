#[cfg(test)]
mod tests {
    use actix_web::test as actix_test;
    use actix_web::{web, App};
    use uuid::Uuid;

    use crate::configuration::ContactSettings;
    use crate::routes::util::util_route;
    use crate::routes::util::utils::{bird_inquiry_message, whatsapp_link};

    fn contact() -> ContactSettings {
        ContactSettings {
            phone_number: "+91 98765 43210".to_string(),
            greeting: "Hi, I would like to inquire about your gamefowl.".to_string(),
            site_url: "https://farm.test/".to_string(),
        }
    }

    #[test]
    fn test_greeting_link_is_url_encoded() {
        let contact = contact();
        let link = whatsapp_link(&contact, contact.greeting.clone()).unwrap();
        assert_eq!(link.phone_number, "+919876543210");
        assert!(link.url.starts_with("https://wa.me/919876543210?text="));
        assert!(!link.url.contains(' '));
        let parsed = reqwest::Url::parse(&link.url).unwrap();
        let (_, text) = parsed.query_pairs().next().unwrap();
        assert_eq!(text, contact.greeting);
    }

    #[test]
    fn test_bird_message_mentions_name_and_page() {
        let id = Uuid::new_v4();
        let message = bird_inquiry_message(&contact(), id, "Red Hatch Stag");
        assert_eq!(
            message,
            format!(
                "Hi, I'm interested in the bird: Red Hatch Stag.\nLink: https://farm.test/birds/{}",
                id
            )
        );

        let mut without_site = contact();
        without_site.site_url = String::new();
        assert_eq!(
            bird_inquiry_message(&without_site, id, "Sweater"),
            "Hi, I'm interested in the bird: Sweater."
        );
    }

    #[test]
    fn test_missing_contact_number_is_an_error() {
        let mut contact = contact();
        contact.phone_number = " ".to_string();
        assert!(whatsapp_link(&contact, "hello".to_string()).is_err());
    }

    #[actix_web::test]
    async fn test_health_check_route() {
        let app = actix_test::init_service(App::new().service(web::scope("/util").configure(util_route))).await;
        let request = actix_test::TestRequest::get().uri("/util/health_check").to_request();
        let response = actix_test::call_service(&app, request).await;
        assert!(response.status().is_success());
    }
}
