//! HTML pages

/// Escape text for safe inclusion in HTML content and quoted attribute values
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        body = body
    )
}

fn paragraph(class: &str, text: Option<&str>) -> String {
    text.map(|t| format!(r#"<p class="{}">{}</p>"#, class, escape(t)))
        .unwrap_or_default()
}

/// Login form, with an optional error or notice line
pub fn login_page(error: Option<&str>, notice: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Please log in</h1>
{notice}
{error}
<form action="/login" method="post">
  <label>Username <input type="text" name="username" autocomplete="username"></label>
  <label>Password <input type="password" name="password" autocomplete="current-password"></label>
  <input type="submit" value="Login">
</form>"#,
        notice = paragraph("notice", notice),
        error = paragraph("error", error),
    );
    layout("Login", &body)
}

fn select(name: &str, options: &[&str]) -> String {
    let options: String = options
        .iter()
        .map(|o| format!(r#"<option value="{0}">{0}</option>"#, escape(o)))
        .collect();
    format!(r#"<select name="{}">{}</select>"#, escape(name), options)
}

/// What the index page shows below the form
#[derive(Debug, Default)]
pub struct IndexView<'a> {
    pub username: &'a str,
    pub prediction: Option<&'a str>,
    pub notice: Option<&'a str>,
    pub error: Option<&'a str>,
}

/// Welcome page with the prediction form
pub fn index_page(view: &IndexView<'_>) -> String {
    let body = format!(
        r#"<h1>Medical Insurance Charge Prediction</h1>
<p>Logged in as {user}. <a href="/logout">Log out</a></p>
<form action="/predict" method="post">
  <label>Age <input type="number" name="age" min="0" max="120" step="1"></label>
  <label>Sex {sex}</label>
  <label>BMI <input type="number" name="bmi" min="10" max="100" step="0.01"></label>
  <label>Children <input type="number" name="children" min="0" max="20" step="1"></label>
  <label>Smoker {smoker}</label>
  <label>Region {region}</label>
  <input type="submit" value="Predict">
</form>
{error}
{prediction}
{notice}"#,
        user = escape(view.username),
        sex = select("sex", &["male", "female"]),
        smoker = select("smoker", &["yes", "no"]),
        region = select("region", &["northeast", "northwest", "southeast", "southwest"]),
        error = paragraph("error", view.error),
        prediction = paragraph("prediction", view.prediction),
        notice = paragraph("notice", view.notice),
    );
    layout("Charge Prediction", &body)
}
