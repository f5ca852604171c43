//! Static page handlers

use askama::Template;
use axum::response::Html;

use crate::error::Result;

#[derive(Template)]
#[template(path = "pages/about.html")]
struct AboutTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "pages/contact.html")]
struct ContactTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "pages/thank_you.html")]
struct ThankYouTemplate {
    title: &'static str,
}

pub async fn about() -> Result<Html<String>> {
    Ok(Html(AboutTemplate { title: "О компании" }.render()?))
}

pub async fn contact() -> Result<Html<String>> {
    Ok(Html(ContactTemplate { title: "Контакты" }.render()?))
}

pub async fn thank_you() -> Result<Html<String>> {
    Ok(Html(ThankYouTemplate {
        title: "Спасибо за заказ",
    }
    .render()?))
}
