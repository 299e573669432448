use std::sync::Arc;

use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use vision_buddy_core::tool::{Tool, ToolResult};

/// The medical news feeds scanned by default.
pub const DEFAULT_FEEDS: [&str; 3] = [
    "https://www.medscape.com/rss/public",
    "https://www.webmd.com/rss/news_breaking.xml",
    "https://www.sciencedaily.com/rss/health_medicine.xml",
];

/// The tool result when no headline matches.
pub const NO_NEWS_NOTICE: &str = "No recent medical news found.";

const MAX_HEADLINES: usize = 5;

#[allow(dead_code)]
#[derive(JsonSchema)]
struct MedicalNewsToolParameters {
    #[schemars(description = "The disease, treatment or technology to look for.")]
    topic: String,
}

/// A tool that scans medical RSS feeds for headlines about a topic.
pub struct MedicalNewsTool {
    client: Client,
    feeds: Arc<[String]>,
    parameter_schema: Value,
}

impl MedicalNewsTool {
    /// Creates a news tool reading [`DEFAULT_FEEDS`].
    pub fn new(client: Client) -> Self {
        Self {
            client,
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            parameter_schema: schema_for!(MedicalNewsToolParameters)
                .to_value(),
        }
    }

    /// Replaces the feeds to scan, in order.
    #[inline]
    pub fn with_feeds<I, S>(mut self, feeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feeds = feeds.into_iter().map(Into::into).collect();
        self
    }
}

impl Tool for MedicalNewsTool {
    fn name(&self) -> &str {
        "medical_news_tool"
    }

    fn description(&self) -> &str {
        r#"
Fetches recent medical news headlines for a topic. Use it when the user asks
for the latest news, updates, or new treatments."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn signature(&self) -> &[&str] {
        &["topic"]
    }

    fn execute(
        &self,
        input: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        let feeds = Arc::clone(&self.feeds);
        async move {
            let topic = input.to_lowercase();
            let mut headlines = Vec::new();
            for url in feeds.iter() {
                let items = match fetch_feed(&client, url).await {
                    Ok(items) => items,
                    Err(err) => {
                        // One broken feed should not hide the others.
                        warn!("skipping feed {url}: {err}");
                        continue;
                    }
                };
                headlines.extend(
                    items
                        .into_iter()
                        .filter(|item| item.mentions(&topic))
                        .map(|item| format!("{}\n{}", item.title, item.link))
                        .take(MAX_HEADLINES - headlines.len()),
                );
                if headlines.len() >= MAX_HEADLINES {
                    break;
                }
            }

            if headlines.is_empty() {
                return Ok(NO_NEWS_NOTICE.to_owned());
            }
            Ok(headlines.join("\n\n"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
}

impl Item {
    /// `topic` must be lowercase already.
    fn mentions(&self, topic: &str) -> bool {
        self.title.to_lowercase().contains(topic)
            || self.description.to_lowercase().contains(topic)
    }
}

#[derive(Debug, thiserror::Error)]
enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed feed: {0}")]
    Parse(#[from] quick_xml::DeError),
}

async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<Item>, FeedError> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_feed(&body)
}

fn parse_feed(xml: &str) -> Result<Vec<Item>, FeedError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss.channel.items)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn feed(items: &[(&str, &str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link, description)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link>\
                     <description><![CDATA[{description}]]></description></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Health News</title>
<link>https://news.example.org</link>{items}
<description>Latest stories</description></channel></rss>"#
        )
    }

    #[test]
    fn test_parse_feed() {
        let xml = feed(&[
            ("New glaucoma drops approved", "https://n.example.org/1", "Eye pressure"),
            ("Flu season", "https://n.example.org/2", "<p>Vaccines</p>"),
        ]);
        let items = parse_feed(&xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "New glaucoma drops approved");
        assert_eq!(items[1].description, "<p>Vaccines</p>");
        assert!(items[0].mentions("glaucoma"));
        assert!(!items[1].mentions("glaucoma"));

        assert!(parse_feed("<html>not a feed").is_err());
    }

    #[tokio::test]
    async fn test_execute() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eyes.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
                ("Glaucoma laser study", "https://n.example.org/a", ""),
                ("Heart health", "https://n.example.org/b", "Cardiology"),
                ("Drops", "https://n.example.org/c", "A new GLAUCOMA drug"),
            ])))
            .mount(&server)
            .await;

        let tool = MedicalNewsTool::new(Client::new()).with_feeds([
            format!("{}/broken.xml", server.uri()),
            format!("{}/eyes.xml", server.uri()),
        ]);
        let output = tool.execute("Glaucoma".to_owned()).await.unwrap();
        assert_eq!(
            output,
            "Glaucoma laser study\nhttps://n.example.org/a\n\n\
             Drops\nhttps://n.example.org/c"
        );

        let output = tool.execute("keratoconus".to_owned()).await.unwrap();
        assert_eq!(output, NO_NEWS_NOTICE);
    }

    #[tokio::test]
    async fn test_headline_limit() {
        let server = MockServer::start().await;
        let items: Vec<_> = (0..4)
            .map(|i| (format!("Myopia update {i}"), format!("https://n.example.org/{i}")))
            .collect();
        let items: Vec<_> = items
            .iter()
            .map(|(title, link)| (title.as_str(), link.as_str(), ""))
            .collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&items)))
            .mount(&server)
            .await;

        let url = format!("{}/feed.xml", server.uri());
        let tool = MedicalNewsTool::new(Client::new()).with_feeds([&url, &url]);
        let output = tool.execute("myopia".to_owned()).await.unwrap();
        assert_eq!(output.split("\n\n").count(), MAX_HEADLINES);
    }
}
