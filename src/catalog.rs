//! Read-only template catalog: the ordered collection of [`Template`]
//! records the surrounding UI filters and searches.

use anyhow::Context;

use crate::{
    error::ForgeResult,
    model::Template,
};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    templates: Vec<Template>,
}

impl Catalog {
    pub fn new(templates: Vec<Template>) -> ForgeResult<Self> {
        for t in &templates {
            t.validate()?;
        }
        Ok(Self { templates })
    }

    pub fn from_json_str(json: &str) -> ForgeResult<Self> {
        let catalog: Catalog = serde_json::from_str(json).context("parse catalog JSON")?;
        Self::new(catalog.templates)
    }

    pub fn from_json_reader(reader: impl std::io::Read) -> ForgeResult<Self> {
        let catalog: Catalog = serde_json::from_reader(reader).context("parse catalog JSON")?;
        Self::new(catalog.templates)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for t in &self.templates {
            if !out.contains(&t.category.as_str()) {
                out.push(&t.category);
            }
        }
        out
    }

    pub fn filter_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Template> {
        self.templates.iter().filter(move |t| t.category == category)
    }

    /// Built-in starter catalog. Sources are remote; callers resolve them to
    /// bytes however they like.
    pub fn sample() -> Self {
        let template = |id: &str,
                        name: &str,
                        source: &str,
                        width: u32,
                        height: u32,
                        category: &str,
                        defaults: &[&str]| Template {
            id: id.to_string(),
            name: name.to_string(),
            source: source.to_string(),
            width,
            height,
            category: category.to_string(),
            default_texts: defaults.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            templates: vec![
                template(
                    "drake",
                    "Drake Hotline Bling",
                    "https://i.imgflip.com/30b1gx.jpg",
                    1200,
                    1200,
                    "classic",
                    &["Old thing", "New thing"],
                ),
                template(
                    "distracted",
                    "Distracted Boyfriend",
                    "https://i.imgflip.com/1ur9b0.jpg",
                    1200,
                    800,
                    "classic",
                    &["New thing", "Me", "Current thing"],
                ),
                template(
                    "change-my-mind",
                    "Change My Mind",
                    "https://i.imgflip.com/24y43o.jpg",
                    1160,
                    768,
                    "debate",
                    &["Change my mind"],
                ),
                template(
                    "two-buttons",
                    "Two Buttons",
                    "https://i.imgflip.com/1g8my4.jpg",
                    600,
                    908,
                    "choices",
                    &["Option A", "Option B"],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_lookup() {
        let catalog = Catalog::sample();
        assert!(catalog.template("drake").is_some());
        assert!(catalog.template("missing").is_none());
        assert_eq!(catalog.template("distracted").unwrap().default_texts.len(), 3);
    }

    #[test]
    fn categories_are_distinct_and_ordered() {
        let catalog = Catalog::sample();
        let cats = catalog.categories();
        assert_eq!(cats[0], "classic");
        let mut dedup = cats.clone();
        dedup.dedup();
        assert_eq!(cats, dedup);
    }

    #[test]
    fn filter_by_category_matches_exactly() {
        let catalog = Catalog::sample();
        let classics: Vec<_> = catalog.filter_by_category("classic").collect();
        assert_eq!(classics.len(), 2);
        assert!(classics.iter().all(|t| t.category == "classic"));
    }

    #[test]
    fn json_parse_and_validation() {
        let json = r#"{
            "templates": [{
                "id": "x",
                "name": "X",
                "source": "x.png",
                "width": 10,
                "height": 10,
                "category": "test",
                "default_texts": ["A"]
            }]
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.templates().len(), 1);

        let bad = json.replace("\"width\": 10", "\"width\": 0");
        assert!(Catalog::from_json_str(&bad).is_err());
    }
}
