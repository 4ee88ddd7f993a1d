use super::*;
use crate::test_support::{context, FakeGenerator, FakeWiki};
use shared::{
    domain::{EduType, Mode, Style, Volume},
    protocol::AuthorInfo,
};

fn request(topic: &str) -> GenerateRequest {
    GenerateRequest {
        topic: topic.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn empty_topic_is_rejected_without_calling_generator() {
    let generator = Arc::new(FakeGenerator::replying("text"));
    let ctx = context(generator.clone(), Arc::new(FakeWiki::default()));
    let err = generate(&ctx, &request("   ")).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "Введите тему!");
    assert!(generator.last_prompt().is_none());
}

#[tokio::test]
async fn unconfigured_generator_reports_unavailable() {
    let ctx = context(
        Arc::new(FakeGenerator::unconfigured()),
        Arc::new(FakeWiki::default()),
    );
    let err = generate(&ctx, &request("Фотосинтез")).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Unavailable);
}

#[tokio::test]
async fn generation_returns_text_and_stats() {
    let generator = Arc::new(FakeGenerator::replying("Один два три"));
    let ctx = context(generator.clone(), Arc::new(FakeWiki::default()));
    let mut req = request("Фотосинтез");
    req.mode = Mode::Conspect;
    req.volume = Volume::Short;
    req.style = Style::School;

    let response = generate(&ctx, &req).await.expect("generate");
    assert!(response.success);
    assert_eq!(response.result.as_deref(), Some("Один два три"));
    let stats = response.stats.expect("stats");
    assert_eq!(stats.words, 3);
    assert_eq!(stats.chars, 12);

    let prompt = generator.last_prompt().expect("prompt");
    assert!(prompt.contains("Напиши конспект на тему: \"Фотосинтез\""));
    assert!(prompt.contains("Напиши кратко, 1-2 страницы."));
    assert!(prompt.contains("Язык для школьника."));
}

#[tokio::test]
async fn generator_failure_maps_to_upstream_error() {
    let ctx = context(
        Arc::new(FakeGenerator::failing("quota exceeded")),
        Arc::new(FakeWiki::default()),
    );
    let err = generate(&ctx, &request("Тема")).await.expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Upstream);
    assert!(err.message.contains("quota exceeded"));
}

#[tokio::test]
async fn title_page_is_prepended_only_for_supported_modes() {
    let ctx = context(
        Arc::new(FakeGenerator::replying("Текст")),
        Arc::new(FakeWiki::default()),
    );
    let author = AuthorInfo {
        name: "Иванов Иван".into(),
        edu_type: EduType::Pupil,
        grade: "9".into(),
        institution: "Школа №1".into(),
        include_title: true,
        ..Default::default()
    };

    let mut req = request("Луна");
    req.mode = Mode::Essay;
    req.author_info = author.clone();
    let result = generate(&ctx, &req).await.expect("generate").result.expect("text");
    assert!(result.starts_with(&"=".repeat(60)));
    assert!(result.contains("ШКОЛА №1"));
    assert!(result.contains("ЭССЕ"));
    assert!(result.contains("Ученик 9 класса"));
    assert!(result.ends_with("Текст"));

    req.mode = Mode::Question;
    let result = generate(&ctx, &req).await.expect("generate").result.expect("text");
    assert_eq!(result, "Текст");
}

#[tokio::test]
async fn selected_articles_feed_prompt_and_sources() {
    let generator = Arc::new(FakeGenerator::replying("Ответ"));
    let wiki = Arc::new(
        FakeWiki::default()
            .with_page("Луна", "Луна — спутник Земли.")
            .with_page("Марс", "Марс — четвёртая планета."),
    );
    let ctx = context(generator.clone(), wiki.clone());
    let mut req = request("Небесные тела");
    req.use_wikipedia = true;
    req.wiki_titles = vec!["Луна".into(), "Марс".into()];
    req.wiki_lang = Some("EN".into());

    let result = generate(&ctx, &req).await.expect("generate").result.expect("text");
    assert!(result.starts_with("Ответ\n\n## Источники"));
    assert!(result.contains("1. Википедия: Луна (https://en.wikipedia.org/wiki/Луна)"));
    assert!(result.contains("2. Википедия: Марс"));

    let prompt = generator.last_prompt().expect("prompt");
    assert!(prompt.contains("=== Луна ===\nЛуна — спутник Земли."));
    assert!(wiki.searches.lock().expect("searches").is_empty());
    let fetches = wiki.fetches.lock().expect("fetches").clone();
    assert_eq!(
        fetches,
        vec![("Луна".to_string(), 12_500), ("Марс".to_string(), 12_500)]
    );
}

#[tokio::test]
async fn wikipedia_without_selection_searches_the_topic() {
    let generator = Arc::new(FakeGenerator::replying("Ответ"));
    let wiki = Arc::new(FakeWiki::default().with_page("Луна", "Луна — спутник."));
    let ctx = context(generator, wiki.clone());
    let mut req = request("Луна");
    req.use_wikipedia = true;

    generate(&ctx, &req).await.expect("generate");
    let searches = wiki.searches.lock().expect("searches").clone();
    assert_eq!(searches, vec![("ru".to_string(), "Луна".to_string(), 3)]);
}

#[tokio::test]
async fn wikipedia_outage_does_not_block_generation() {
    let generator = Arc::new(FakeGenerator::replying("Ответ"));
    let wiki = Arc::new(FakeWiki {
        fail_search: true,
        ..Default::default()
    });
    let ctx = context(generator, wiki);
    let mut req = request("Луна");
    req.use_wikipedia = true;

    let response = generate(&ctx, &req).await.expect("generate");
    assert_eq!(response.result.as_deref(), Some("Ответ"));
}

#[tokio::test]
async fn search_validates_query_and_language() {
    let ctx = context(
        Arc::new(FakeGenerator::replying("x")),
        Arc::new(FakeWiki::default().with_page("Луна", "Луна.")),
    );

    let err = search_articles(
        &ctx,
        &WikiSearchRequest {
            query: " ".into(),
            lang: None,
        },
    )
    .await
    .expect_err("empty query");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = search_articles(
        &ctx,
        &WikiSearchRequest {
            query: "Луна".into(),
            lang: Some("evil.example/".into()),
        },
    )
    .await
    .expect_err("bad lang");
    assert_eq!(err.code, ErrorCode::Validation);

    let response = search_articles(
        &ctx,
        &WikiSearchRequest {
            query: "Луна".into(),
            lang: None,
        },
    )
    .await
    .expect("search");
    assert!(response.success);
    assert_eq!(response.results[0].title, "Луна");
}

#[tokio::test]
async fn search_outage_maps_to_upstream_error() {
    let ctx = context(
        Arc::new(FakeGenerator::replying("x")),
        Arc::new(FakeWiki {
            fail_search: true,
            ..Default::default()
        }),
    );
    let err = search_articles(
        &ctx,
        &WikiSearchRequest {
            query: "Луна".into(),
            lang: Some("ru".into()),
        },
    )
    .await
    .expect_err("outage");
    assert_eq!(err.code, ErrorCode::Upstream);
}

#[test]
fn status_reports_generator_readiness() {
    let ctx = context(
        Arc::new(FakeGenerator::unconfigured()),
        Arc::new(FakeWiki::default()),
    );
    let status = status(&ctx);
    assert!(!status.api_ready);
    assert_eq!(status.model, "fake-model");
    assert!(status.key_exists);
    assert_eq!(status.key_length, 12);
}

#[test]
fn title_page_layout_for_student_without_optional_fields() {
    let author = AuthorInfo::default();
    let page = prompts::title_page("Тема", &author, Mode::Doklad, 2026);
    let lines: Vec<&str> = page.lines().collect();
    assert_eq!(lines[2], "[УЧЕБНОЕ ЗАВЕДЕНИЕ]");
    assert_eq!(lines[6], "ДОКЛАД");
    assert_eq!(lines[9], "«Тема»");
    assert_eq!(lines[14], "Студент 1 курса");
    assert!(page.contains("2026 год"));
    assert!(!page.contains("Группа:"));
    assert!(!page.contains("Преподаватель:"));
}
