use todolist_core::{Task, TaskFilter, TaskStatus, TaskValidationError};

#[test]
fn task_serialization_uses_persisted_field_names() {
    let task = Task {
        id: 7,
        title: "Go to the Gym".to_string(),
        is_completed: true,
    };

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["title"], "Go to the Gym");
    assert_eq!(json["isCompleted"], true);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
    assert_eq!(decoded.status(), TaskStatus::Done);
}

#[test]
fn missing_completion_flag_defaults_to_active() {
    let decoded: Task =
        serde_json::from_value(serde_json::json!({ "id": 1, "title": "Buy Milk" })).unwrap();
    assert!(!decoded.is_completed);
}

#[test]
fn filter_serializes_as_snake_case() {
    let json = serde_json::to_value(TaskFilter::ShowOnlyDone).unwrap();
    assert_eq!(json, "show_only_done");
}

#[test]
fn validate_flags_records_with_short_titles() {
    let task = Task {
        id: 1,
        title: " a ".to_string(),
        is_completed: false,
    };
    assert_eq!(
        task.validate().unwrap_err(),
        TaskValidationError::TitleTooShort { length: 1 }
    );
}
