use crate::models::{Dataset, Group, Settings, Student};
use crate::roster::default_avatar;

pub fn sample_dataset() -> Dataset {
    let groups = vec![
        ("f-cs", "Computer Science", Some("s-avery")),
        ("f-me", "Mechanical Engineering", Some("s-kiara")),
        ("f-bio", "Biotechnology", None),
    ]
    .into_iter()
    .map(|(id, name, cr)| Group {
        id: id.to_string(),
        name: name.to_string(),
        cr: cr.map(str::to_string),
    })
    .collect();

    let students = vec![
        ("s-avery", "Avery Lee", "f-cs", 92),
        ("s-jules", "Jules Moreno", "f-cs", 78),
        ("s-noor", "Noor Haddad", "f-cs", 92),
        ("s-kiara", "Kiara Patel", "f-me", 85),
        ("s-tomas", "Tomas Silva", "f-me", 61),
        ("s-mei", "Mei Tanaka", "f-bio", 47),
        ("s-ola", "Ola Nwosu", "f-bio", 33),
    ]
    .into_iter()
    .map(|(id, name, group_id, percentage)| Student {
        id: id.to_string(),
        name: name.to_string(),
        group_id: group_id.to_string(),
        photo: default_avatar(name),
        percentage,
    })
    .collect();

    Dataset {
        groups,
        students,
        settings: Settings::default(),
    }
}
