// src/topics.rs
//! Fixed topic catalog for the quote video pipeline.

use rand::seq::SliceRandom;

pub const TOPICS: &[&str] = &[
    "Love Quotes",
    "Friendship Quotes",
    "Inspirational Quotes",
    "Motivational Quotes",
    "Life Quotes",
    "Happiness Quotes",
    "Positive Quotes",
    "Hope Quotes",
    "Faith & Spiritual Quotes",
    "Success Quotes",
    "Funny Quotes",
    "Wisdom Quotes",
    "Leadership Quotes",
    "Family Quotes",
    "Self-Love Quotes",
    "Confidence Quotes",
    "Attitude Quotes",
    "Courage Quotes",
    "Perseverance Quotes",
    "Dream Quotes",
    "Mindfulness Quotes",
    "Gratitude Quotes",
    "Kindness Quotes",
    "Teamwork Quotes",
    "Hard Work Quotes",
    "Change Quotes",
    "Patience Quotes",
    "Failure Quotes",
    "Forgiveness Quotes",
    "Equality & Unity Quotes",
    "Resilience Quotes",
    "Nature Quotes",
    "Philosophical (Deep) Quotes",
    "Education & Knowledge Quotes",
    "Travel Quotes",
    "Adventure Quotes",
    "Fitness Quotes",
    "Mental Health Quotes",
    "Creativity Quotes",
    "Business & Entrepreneur Quotes",
    "Compassion Quotes",
    "Humility Quotes",
    "Self-Improvement Quotes",
    "Sad/Heartbreak Quotes",
    "Freedom Quotes",
    "Time Quotes",
    "Trust & Loyalty Quotes",
    "Integrity & Honesty Quotes",
    "Peace Quotes",
    "Live in the Moment (Carpe Diem) Quotes",
];

/// Pick a topic uniformly at random from [`TOPICS`].
pub fn random_topic() -> &'static str {
    TOPICS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Inspirational Quotes")
}
