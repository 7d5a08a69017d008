// ABOUTME: Property tests for proxy config rendering.
// ABOUTME: Any domain and color renders to a config with no placeholders left.

use proptest::prelude::*;
use switchyard::config::AppConfig;
use switchyard::proxy::{Substitutions, TemplateError, render};
use switchyard::types::Color;

const TEMPLATE: &str = "upstream api { server {{UPSTREAM_API}}; }\n\
                        upstream frontend { server {{UPSTREAM_FRONTEND}}; }\n\
                        server { server_name {{DOMAIN}} www.{{DOMAIN}}; }\n";

fn color() -> impl Strategy<Value = Color> {
    prop_oneof![Just(Color::Blue), Just(Color::Green)]
}

proptest! {
    #[test]
    fn rendered_config_points_only_at_the_chosen_color(
        color in color(),
        domain in "[a-z][a-z0-9-]{0,20}(\\.[a-z]{2,6}){1,2}",
    ) {
        let app = AppConfig::default();
        let subs = Substitutions::for_color(&app, color, &domain);
        let rendered = render(TEMPLATE, &subs).unwrap();

        prop_assert!(!rendered.contains("{{"));
        let api_upstream = format!("server {}-api-1:8000;", color);
        let frontend_upstream = format!("server {}-frontend-1:3000;", color);
        let other_api = format!("{}-api-1", color.other());
        prop_assert!(rendered.contains(&api_upstream));
        prop_assert!(rendered.contains(&frontend_upstream));
        prop_assert!(!rendered.contains(&other_api));
        prop_assert!(rendered.matches(domain.as_str()).count() >= 2);
    }

    #[test]
    fn rendering_a_rendered_config_changes_nothing(color in color()) {
        let subs = Substitutions::for_color(&AppConfig::default(), color, "example.com");
        let once = render(TEMPLATE, &subs).unwrap();
        let twice = render(&once, &subs).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn unknown_placeholders_are_always_rejected(name in "[A-Z_]{1,12}") {
        prop_assume!(!["UPSTREAM_API", "UPSTREAM_FRONTEND", "DOMAIN"].contains(&name.as_str()));
        let template = format!("{}\nextra {{{{{}}}}};\n", TEMPLATE, name);
        let subs = Substitutions::for_color(&AppConfig::default(), Color::Blue, "example.com");

        let err = render(&template, &subs).unwrap_err();
        let expected = format!("{{{{{}}}}}", name);
        prop_assert!(
            matches!(err, TemplateError::Unresolved(token) if token == expected)
        );
    }
}

#[test]
fn both_colors_differ_only_in_upstreams() {
    let app = AppConfig::default();
    let blue =
        render(TEMPLATE, &Substitutions::for_color(&app, Color::Blue, "example.com")).unwrap();
    let green =
        render(TEMPLATE, &Substitutions::for_color(&app, Color::Green, "example.com")).unwrap();

    assert_ne!(blue, green);
    assert_eq!(blue.replace("blue-", "green-"), green);
}
