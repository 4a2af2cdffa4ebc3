//! The device-independent document produced from a CV snapshot.
//!
//! `render` is the only place that decides what a CV looks like structurally.
//! Preview and export both start from its output.

use serde::Serialize;

use crate::cv::models::{CvRecord, Degree, Experience};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub sections: Vec<DocumentSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Interests,
    Skills,
    Experience,
    Education,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSection {
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Regular,
    Emphasis,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String, style: TextStyle },
    ListItem { text: String },
    /// One experience or degree entry, kept together as a unit.
    Group { blocks: Vec<Block> },
}

/// Maps a record snapshot to its document. Pure and deterministic.
///
/// Section order: header, interests, skills, experience, education.
/// A section whose underlying list is empty is left out entirely.
pub fn render(record: &CvRecord) -> Document {
    let info = &record.personal_info;
    let mut sections = Vec::new();

    let mut header = Vec::new();
    push_heading(&mut header, 1, &info.full_name());
    push_paragraph(&mut header, &info.job_title, TextStyle::Emphasis);
    if !info.synonymous_titles.is_empty() {
        let line = format!("Also known as: {}", info.synonymous_titles.join(", "));
        push_paragraph(&mut header, &line, TextStyle::Muted);
    }
    if !header.is_empty() {
        sections.push(DocumentSection {
            kind: SectionKind::Header,
            blocks: header,
        });
    }

    if let Some(section) = list_section(SectionKind::Interests, "Interests", &info.interests) {
        sections.push(section);
    }
    if let Some(section) = list_section(SectionKind::Skills, "Skills", &record.skills) {
        sections.push(section);
    }
    if let Some(section) = group_section(
        SectionKind::Experience,
        "Experience",
        &record.experiences,
        experience_group,
    ) {
        sections.push(section);
    }
    if let Some(section) =
        group_section(SectionKind::Education, "Education", &record.degrees, degree_group)
    {
        sections.push(section);
    }

    Document { sections }
}

fn list_section(kind: SectionKind, title: &str, items: &[String]) -> Option<DocumentSection> {
    if items.is_empty() {
        return None;
    }
    let mut blocks = vec![Block::Heading {
        level: 2,
        text: title.to_string(),
    }];
    blocks.extend(items.iter().map(|item| Block::ListItem { text: item.clone() }));
    Some(DocumentSection { kind, blocks })
}

fn group_section<T>(
    kind: SectionKind,
    title: &str,
    entries: &[T],
    to_blocks: fn(&T) -> Vec<Block>,
) -> Option<DocumentSection> {
    if entries.is_empty() {
        return None;
    }
    let mut blocks = vec![Block::Heading {
        level: 2,
        text: title.to_string(),
    }];
    blocks.extend(entries.iter().map(|entry| Block::Group {
        blocks: to_blocks(entry),
    }));
    Some(DocumentSection { kind, blocks })
}

fn experience_group(exp: &Experience) -> Vec<Block> {
    let mut blocks = Vec::new();
    push_heading(&mut blocks, 3, &exp.position);
    push_paragraph(&mut blocks, &exp.company, TextStyle::Emphasis);
    push_paragraph(&mut blocks, &exp.period, TextStyle::Muted);
    push_paragraph(&mut blocks, &exp.description, TextStyle::Regular);
    blocks
}

fn degree_group(degree: &Degree) -> Vec<Block> {
    let mut blocks = Vec::new();
    push_heading(&mut blocks, 3, &degree.degree);
    push_paragraph(&mut blocks, &degree.institution, TextStyle::Emphasis);
    push_paragraph(&mut blocks, &degree.year, TextStyle::Muted);
    push_paragraph(&mut blocks, &degree.description, TextStyle::Regular);
    blocks
}

fn push_heading(blocks: &mut Vec<Block>, level: u8, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(Block::Heading {
            level,
            text: text.to_string(),
        });
    }
}

fn push_paragraph(blocks: &mut Vec<Block>, text: &str, style: TextStyle) {
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(Block::Paragraph {
            text: text.to_string(),
            style,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::models::PersonalInfo;

    fn sample() -> CvRecord {
        CvRecord {
            personal_info: PersonalInfo {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                job_title: "Analyst".to_string(),
                synonymous_titles: vec!["Mathematician".to_string(), "Writer".to_string()],
                interests: vec![],
            },
            skills: vec!["Rust".to_string(), "Go".to_string()],
            experiences: vec![Experience {
                position: "Engineer".to_string(),
                company: "Analytical Engines Ltd".to_string(),
                period: "1842 - 1843".to_string(),
                description: "Wrote the first program".to_string(),
            }],
            degrees: vec![],
        }
    }

    impl Document {
        fn section(&self, kind: SectionKind) -> Option<&DocumentSection> {
            self.sections.iter().find(|s| s.kind == kind)
        }
    }

    fn kinds(doc: &Document) -> Vec<SectionKind> {
        doc.sections.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = sample();
        assert_eq!(render(&record), render(&record));
    }

    #[test]
    fn test_empty_degrees_section_omitted() {
        let doc = render(&sample());
        assert!(doc.section(SectionKind::Education).is_none());
        assert_eq!(
            kinds(&doc),
            vec![SectionKind::Header, SectionKind::Skills, SectionKind::Experience]
        );
    }

    #[test]
    fn test_header_blocks_in_order() {
        let doc = render(&sample());
        let header = doc.section(SectionKind::Header).unwrap();
        assert_eq!(
            header.blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Ada Lovelace".to_string()
                },
                Block::Paragraph {
                    text: "Analyst".to_string(),
                    style: TextStyle::Emphasis
                },
                Block::Paragraph {
                    text: "Also known as: Mathematician, Writer".to_string(),
                    style: TextStyle::Muted
                },
            ]
        );
    }

    #[test]
    fn test_alternative_titles_line_only_when_present() {
        let mut record = sample();
        record.personal_info.synonymous_titles.clear();
        let doc = render(&record);
        assert_eq!(doc.section(SectionKind::Header).unwrap().blocks.len(), 2);
    }

    #[test]
    fn test_interests_rendered_only_when_present() {
        let mut record = sample();
        assert!(render(&record).section(SectionKind::Interests).is_none());
        record.personal_info.interests = vec!["Chess".to_string()];
        let doc = render(&record);
        assert_eq!(kinds(&doc)[1], SectionKind::Interests);
    }

    #[test]
    fn test_experience_group_field_order() {
        let doc = render(&sample());
        let section = doc.section(SectionKind::Experience).unwrap();
        assert_eq!(
            section.blocks[0],
            Block::Heading {
                level: 2,
                text: "Experience".to_string()
            }
        );
        let Block::Group { blocks } = &section.blocks[1] else {
            panic!("expected a group");
        };
        let texts: Vec<&str> = blocks
            .iter()
            .map(|b| match b {
                Block::Heading { text, .. } | Block::Paragraph { text, .. } => text.as_str(),
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                "Engineer",
                "Analytical Engines Ltd",
                "1842 - 1843",
                "Wrote the first program"
            ]
        );
    }

    #[test]
    fn test_skills_keep_record_order() {
        let doc = render(&sample());
        let items: Vec<_> = doc.section(SectionKind::Skills).unwrap().blocks[1..].to_vec();
        assert_eq!(
            items,
            vec![
                Block::ListItem {
                    text: "Rust".to_string()
                },
                Block::ListItem {
                    text: "Go".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_empty_record_renders_empty_document() {
        assert!(render(&CvRecord::default()).sections.is_empty());
    }
}
