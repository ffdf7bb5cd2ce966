//! Benchmarks for similarity model construction
//!
//! Run with: cargo bench --package scorers
//!
//! Builds the content and collaborative models over a synthetic catalog so
//! the benchmark has no external data dependency.

use catalog::{CatalogSnapshot, Genre, Movie, Rating};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scorers::{CollaborativeModel, ContentModel};
use std::sync::Arc;

fn synthetic_snapshot(movies: u32, users: u32) -> Arc<CatalogSnapshot> {
    let genres = [
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Horror,
        Genre::Romance,
        Genre::ScienceFiction,
    ];

    let mut snapshot = CatalogSnapshot::new();
    for id in 1..=movies {
        snapshot.insert_movie(Movie {
            id,
            title: format!("Movie {}", id),
            overview: Some(format!(
                "A story about subject {} in setting {} with theme {}",
                id % 31,
                id % 17,
                id % 7
            )),
            tagline: None,
            genres: vec![genres[(id % 6) as usize]],
            vote_average: 5.0 + (id % 5) as f32,
            vote_count: 50 + id,
            popularity: (id % 100) as f32,
            runtime: Some(90 + (id % 60)),
            release_year: Some(1990 + (id % 35) as u16),
        });
    }
    for user in 1..=users {
        // Each user rates a deterministic slice of the catalog
        for step in 0..20u32 {
            let movie_id = (user * 13 + step * 7) % movies + 1;
            let value = 0.5 + ((user + step) % 10) as f32 * 0.5;
            snapshot.insert_rating(Rating {
                user_id: user,
                movie_id,
                rating: value,
                timestamp: 1_700_000_000 + (user * 100 + step) as i64,
            });
        }
    }
    snapshot.build_genre_index();
    Arc::new(snapshot)
}

fn bench_content_model_build(c: &mut Criterion) {
    let snapshot = synthetic_snapshot(500, 100);

    c.bench_function("content_model_build_500", |b| {
        b.iter(|| {
            let model = ContentModel::build(black_box(&snapshot)).unwrap();
            black_box(model)
        })
    });
}

fn bench_collaborative_model_build(c: &mut Criterion) {
    let snapshot = synthetic_snapshot(500, 100);

    c.bench_function("collaborative_model_build_100_users", |b| {
        b.iter(|| {
            let model = CollaborativeModel::build(black_box(&snapshot)).unwrap();
            black_box(model)
        })
    });
}

criterion_group!(
    benches,
    bench_content_model_build,
    bench_collaborative_model_build
);
criterion_main!(benches);
