use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const E: &str = "Invalid selector";
lazy_static! {
    static ref FORM: Selector = Selector::parse("form").expect(E);
    static ref CONTROLS: Selector = Selector::parse("input, select, textarea").expect(E);
    static ref OPTION: Selector = Selector::parse("option").expect(E);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The successful controls of an HTML form, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub action: Url,
    pub method: Method,
    pub fields: Vec<(String, String)>,
}

impl Form {
    /// Reads the first `<form>` of `doc`, resolving its action against `base`.
    pub fn first(doc: &Html, base: &Url) -> Option<Result<Form, url::ParseError>> {
        doc.select(&FORM).next().map(|form| Form::read(form, base))
    }

    fn read(form: ElementRef, base: &Url) -> Result<Form, url::ParseError> {
        let action = match form.value().attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => base.join(action)?,
            _ => base.clone(),
        };
        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => Method::Post,
            _ => Method::Get,
        };

        let fields = form
            .select(&CONTROLS)
            .filter_map(|control| {
                let el = control.value();
                let name = el.attr("name")?.to_string();
                if el.attr("disabled").is_some() {
                    return None;
                }
                let value = match el.name() {
                    "select" => selected_option(control)?,
                    "textarea" => control.text().collect::<String>(),
                    _ => {
                        let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                        match kind.as_str() {
                            "submit" | "button" | "image" | "reset" | "file" => return None,
                            "checkbox" | "radio" if el.attr("checked").is_none() => return None,
                            "checkbox" | "radio" => el.attr("value").unwrap_or("on").to_string(),
                            _ => el.attr("value").unwrap_or_default().to_string(),
                        }
                    }
                };
                Some((name, value))
            })
            .collect();

        Ok(Form {
            action,
            method,
            fields,
        })
    }

    /// Sets `name` to `value`, adding the field when the form lacks it.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn selected_option(select: ElementRef) -> Option<String> {
    let options = select.select(&OPTION).collect::<Vec<_>>();
    let option = options
        .iter()
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.first())?;
    Some(
        option
            .value()
            .attr("value")
            .map(ToString::to_string)
            .unwrap_or_else(|| option.text().collect::<String>().trim().to_string()),
    )
}
