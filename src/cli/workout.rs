//! CLI handlers for groups, exercises, and history.

use crate::resources::IgniteApi;

/// Handle `ignite groups`.
pub async fn handle_groups(api: &IgniteApi) -> Result<(), Box<dyn std::error::Error>> {
    for group in api.groups().await? {
        println!("{group}");
    }
    Ok(())
}

/// Handle `ignite exercises <group>`.
pub async fn handle_exercises(
    api: &IgniteApi,
    group: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let exercises = api.exercises_by_group(group).await?;
    if exercises.is_empty() {
        println!("No exercises for {group}");
    }
    for exercise in exercises {
        println!(
            "{:>4}  {}  ({} x {})",
            exercise.id, exercise.name, exercise.series, exercise.repetitions
        );
    }
    Ok(())
}

/// Handle `ignite exercise <id>`.
pub async fn handle_exercise(api: &IgniteApi, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let exercise = api.exercise(id).await?;
    println!("{} [{}]", exercise.name, exercise.group);
    println!("  {} series x {} repetitions", exercise.series, exercise.repetitions);
    if let Some(demo) = exercise.demo.as_deref() {
        println!("  Demo: {}", api.exercise_demo_url(demo));
    }
    Ok(())
}

/// Handle `ignite history`.
pub async fn handle_history(api: &IgniteApi) -> Result<(), Box<dyn std::error::Error>> {
    let sections = api.history().await?;
    if sections.is_empty() {
        println!("No exercises registered yet");
    }
    for section in sections {
        println!("{}", section.title);
        for entry in section.data {
            println!("  {}  {} ({})", entry.hour, entry.name, entry.group);
        }
    }
    Ok(())
}

/// Handle `ignite history add <exercise-id>`.
pub async fn handle_history_add(
    api: &IgniteApi,
    exercise_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    api.register_history(exercise_id).await?;
    println!("✅ Exercise registered");
    Ok(())
}
