use shared::{
    domain::{Mode, Style, Volume},
    protocol::AuthorInfo,
};

use crate::wiki::Article;

const RULE_WIDTH: usize = 60;

pub fn build_prompt(
    mode: Mode,
    topic: &str,
    volume: Volume,
    style: Style,
    articles: &[Article],
) -> String {
    let volume_text = volume.instruction();
    let style_text = style.instruction();

    let mut prompt = match mode {
        Mode::Referat => format!(
            r#"Напиши реферат на тему: "{topic}"

Требования:
- {volume_text}
- {style_text}
- Русский язык
- Реальные факты, даты, имена

Структура:
# РЕФЕРАТ
## Тема: {topic}

## ВВЕДЕНИЕ
- Актуальность
- Цель и задачи

## ОСНОВНАЯ ЧАСТЬ
### Глава 1. [Название]
[Содержание с фактами]

### Глава 2. [Название]
[Содержание с фактами]

## ЗАКЛЮЧЕНИЕ
- Выводы

## СПИСОК ЛИТЕРАТУРЫ
1. [Источник]
2. [Источник]

Пиши содержательно, чтобы можно было показать учителю!
"#
        ),
        Mode::Conspect => format!(
            r#"Напиши конспект на тему: "{topic}"

Требования:
- {volume_text}
- {style_text}
- Русский язык

Структура:
# КОНСПЕКТ: {topic}

## Основные понятия
**Термин** — определение

## Содержание
### 1. [Раздел]
• Факт
• Факт

### 2. [Раздел]
• Факт

## Выводы
1. Вывод
2. Вывод

Пиши реальную информацию по теме!
"#
        ),
        Mode::Doklad => format!(
            r#"Напиши доклад на тему: "{topic}"

Требования:
- {volume_text}
- {style_text}
- Русский язык
- Для выступления перед классом

Структура:
# ДОКЛАД: {topic}

## Вступление
Здравствуйте! Тема моего доклада...

## Основная часть
[Подробный рассказ с фактами]

## Заключение
Спасибо за внимание!

Пиши интересно и содержательно!
"#
        ),
        Mode::Question => format!(
            r#"Ответь на вопрос: "{topic}"

Требования:
- {volume_text}
- {style_text}
- Русский язык

Структура:
# Вопрос: {topic}

## Краткий ответ
[2-3 предложения]

## Развёрнутый ответ
[Подробное объяснение]

## Примеры
1. Пример
2. Пример

## Вывод
[Итог]
"#
        ),
        Mode::Retell => format!(
            r#"Сделай пересказ текста: "{topic}"

Требования:
- {volume_text}
- {style_text}
- Русский язык

Структура:
# ПЕРЕСКАЗ

## Кратко
[О чём текст]

## Подробный пересказ
[Содержание своими словами]

## Главная мысль
[Что хотел сказать автор]
"#
        ),
        Mode::Essay => format!(
            r#"Напиши эссе на тему: "{topic}"

Требования:
- {volume_text}
- {style_text}
- Русский язык
- Личные размышления

Структура:
# ЭССЕ: {topic}

*"Эпиграф"*

## Вступление
[Введение в тему]

## Размышления
[Мысли с аргументами и примерами]

## Заключение
[Личные выводы]
"#
        ),
    };

    if !articles.is_empty() {
        prompt.push_str(
            "\nОпирайся на следующие материалы из Википедии. Используй факты из них, \
             не выдумывай того, чего в них нет:\n\n",
        );
        let sources = articles
            .iter()
            .map(|article| format!("=== {} ===\n{}", article.title, article.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        prompt.push_str(&sources);
        prompt.push('\n');
    }

    prompt
}

pub fn title_page(topic: &str, author: &AuthorInfo, mode: Mode, year: i32) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let institution = match author.institution.trim() {
        "" => "[УЧЕБНОЕ ЗАВЕДЕНИЕ]".to_string(),
        name => name.to_uppercase(),
    };
    let edu_type = author.edu_type;

    let mut lines = vec![
        heavy.clone(),
        String::new(),
        institution,
        String::new(),
        light.clone(),
        String::new(),
        mode.work_type().to_string(),
        String::new(),
        "на тему:".to_string(),
        format!("«{topic}»"),
        String::new(),
        light.clone(),
        String::new(),
        "Выполнил(а):".to_string(),
        format!(
            "{} {} {}",
            edu_type.label(),
            author.grade.trim(),
            edu_type.grade_unit()
        ),
    ];

    if !author.name.trim().is_empty() {
        lines.push(author.name.trim().to_string());
    }
    if !author.group.trim().is_empty() {
        lines.push(format!("Группа: {}", author.group.trim()));
    }
    if !author.teacher.trim().is_empty() {
        lines.push(String::new());
        lines.push(format!("Преподаватель: {}", author.teacher.trim()));
    }

    lines.extend([
        String::new(),
        light,
        String::new(),
        format!("{year} год"),
        String::new(),
        heavy,
    ]);
    lines.join("\n")
}

pub fn sources_section(articles: &[Article]) -> String {
    let mut section = String::from("## Источники\n");
    for (index, article) in articles.iter().enumerate() {
        section.push_str(&format!(
            "{}. Википедия: {} ({})\n",
            index + 1,
            article.title,
            article.url
        ));
    }
    section
}
