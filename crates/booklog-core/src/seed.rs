//! Demo data: three accounts, ten books and a handful of comments.
//!
//! Seeding is idempotent. Users are matched by username, books by title and
//! comments by (book, user, content), and only the missing ones are added.

use crate::error::{BooklogError, Result};
use crate::models::{BookDraft, Role, User};
use crate::storage::covers::CoverStore;
use crate::storage::database::Database;
use crate::storage::repositories::{
    BookRepository, CommentRepository, SqliteBookRepository, SqliteCommentRepository,
};

/// Cover used for seeded books whose image is missing from the uploads dir.
pub const DEFAULT_COVER_URL: &str = "/uploads/CoverNotFound.png";

#[derive(Clone, Copy, PartialEq, Eq)]
enum SeedUser {
    Admin,
    Author1,
    Reader1,
}

const USERS: &[(SeedUser, &str, &str, Role)] = &[
    (SeedUser::Admin, "admin", "Admin123!", Role::Admin),
    (SeedUser::Author1, "author1", "Test123!", Role::Author),
    (SeedUser::Reader1, "reader1", "Test123!", Role::Reader),
];

struct SeedBook {
    title: &'static str,
    author_name: &'static str,
    genre: &'static str,
    description: &'static str,
    cover: &'static str,
    owner: SeedUser,
}

const BOOKS: &[SeedBook] = &[
    SeedBook {
        title: "Clean Code",
        author_name: "Robert C. Martin",
        genre: "Programming",
        description: "Writing cleaner and more maintainable code.",
        cover: "/uploads/Cleancode.jpeg",
        owner: SeedUser::Author1,
    },
    SeedBook {
        title: "The Pragmatic Programmer",
        author_name: "Andrew Hunt & David Thomas",
        genre: "Programming",
        description: "Practical tips for real software development.",
        cover: "/uploads/pragmatic-programmer-the.jpg",
        owner: SeedUser::Author1,
    },
    SeedBook {
        title: "1984",
        author_name: "George Orwell",
        genre: "Fiction",
        description: "A dystopian classic.",
        cover: "/uploads/1984.jpg",
        owner: SeedUser::Admin,
    },
    SeedBook {
        title: "The Hobbit",
        author_name: "J.R.R. Tolkien",
        genre: "Fantasy",
        description: "Adventure story in Middle-earth.",
        cover: "/uploads/Hobbit.jpeg",
        owner: SeedUser::Admin,
    },
    SeedBook {
        title: "Deep Work",
        author_name: "Cal Newport",
        genre: "Productivity",
        description: "Focus and avoiding distractions.",
        cover: "/uploads/DeepWork.jpg",
        owner: SeedUser::Author1,
    },
    SeedBook {
        title: "Atomic Habits",
        author_name: "James Clear",
        genre: "Self-Improvement",
        description: "Small habits that build big results.",
        cover: "/uploads/Atomic.jpg",
        owner: SeedUser::Author1,
    },
    SeedBook {
        title: "Sapiens",
        author_name: "Yuval Noah Harari",
        genre: "History",
        description: "A short history of humankind.",
        cover: "/uploads/Sapiens.jpg",
        owner: SeedUser::Admin,
    },
    SeedBook {
        title: "Thinking, Fast and Slow",
        author_name: "Daniel Kahneman",
        genre: "Psychology",
        description: "How we think and make decisions.",
        cover: "/uploads/Thinking.jpg",
        owner: SeedUser::Admin,
    },
    SeedBook {
        title: "Dune",
        author_name: "Frank Herbert",
        genre: "Sci-Fi",
        description: "Politics, power, and survival on Arrakis.",
        cover: "/uploads/Dune.jpg",
        owner: SeedUser::Author1,
    },
    SeedBook {
        title: "The Alchemist",
        author_name: "Paulo Coelho",
        genre: "Fiction",
        description: "A simple story about purpose and goals.",
        cover: "/uploads/TheAlchemist.jpg",
        owner: SeedUser::Author1,
    },
];

const COMMENTS: &[(&str, SeedUser, &str)] = &[
    ("Clean Code", SeedUser::Reader1, "This helped me understand what 'clean code' actually means."),
    ("Clean Code", SeedUser::Author1, "Good examples, but you need to practice it for it to stick."),
    ("Clean Code", SeedUser::Admin, "Solid book for anyone doing software projects."),
    ("The Pragmatic Programmer", SeedUser::Reader1, "Easy to read and feels very practical."),
    ("The Pragmatic Programmer", SeedUser::Author1, "Lots of small tips that actually matter in real code."),
    ("The Pragmatic Programmer", SeedUser::Admin, "A classic book, still relevant."),
    ("1984", SeedUser::Reader1, "Kinda scary how relevant parts of it still are."),
    ("1984", SeedUser::Admin, "One of the most famous dystopian books for a reason."),
    ("The Hobbit", SeedUser::Reader1, "Fun story and I like the adventure vibe."),
    ("The Hobbit", SeedUser::Author1, "Good intro to Tolkien before LOTR."),
    ("The Hobbit", SeedUser::Admin, "Classic fantasy, easy recommendation."),
    ("Deep Work", SeedUser::Reader1, "Made me realize how distracted I am while studying."),
    ("Deep Work", SeedUser::Author1, "Helpful if you actually follow the rules and routines."),
    ("Deep Work", SeedUser::Admin, "Good book for productivity, especially for students."),
    ("Atomic Habits", SeedUser::Reader1, "Simple idea but it works when you track habits."),
    ("Atomic Habits", SeedUser::Author1, "I like the examples, it keeps it easy to understand."),
    ("Atomic Habits", SeedUser::Admin, "Good motivational book without being too cringe."),
    ("Atomic Habits", SeedUser::Reader1, "The 1% better every day thing is a nice mindset."),
    ("Sapiens", SeedUser::Reader1, "Interesting overview, but some parts felt heavy."),
    ("Sapiens", SeedUser::Admin, "Big ideas and good discussion starter."),
    ("Thinking, Fast and Slow", SeedUser::Reader1, "Hard at times, but I learned a lot about bias."),
    ("Thinking, Fast and Slow", SeedUser::Author1, "Makes you think twice before trusting your first answer."),
    ("Thinking, Fast and Slow", SeedUser::Admin, "Good book, but not the easiest read."),
    ("Dune", SeedUser::Reader1, "The world-building is crazy good."),
    ("Dune", SeedUser::Author1, "A bit slow start, but it becomes really interesting."),
    ("Dune", SeedUser::Admin, "Sci-fi classic, deserves the hype."),
    ("The Alchemist", SeedUser::Reader1, "Short and simple, good message."),
    ("The Alchemist", SeedUser::Author1, "Not for everyone, but it's a nice easy read."),
];

/// What a seeding run added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub books_created: usize,
    pub comments_created: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.users_created == 0 && self.books_created == 0 && self.comments_created == 0
    }
}

struct SeededUsers {
    admin: User,
    author1: User,
    reader1: User,
}

impl SeededUsers {
    fn get(&self, who: SeedUser) -> &User {
        match who {
            SeedUser::Admin => &self.admin,
            SeedUser::Author1 => &self.author1,
            SeedUser::Reader1 => &self.reader1,
        }
    }
}

/// Returns the existing user, giving it `role` if it has another one, or
/// creates it.
fn ensure_user(db: &Database, username: &str, password: &str, role: Role) -> Result<(User, bool)> {
    match db.find_user_by_username(username)? {
        Some(user) if user.role == role => Ok((user, false)),
        Some(_) => Ok((db.set_user_role(username, role)?, false)),
        None => Ok((db.create_user(username, password, role)?, true)),
    }
}

/// Inserts the missing demo rows. With `covers`, a book whose cover file is
/// not in the store gets [`DEFAULT_COVER_URL`] instead.
pub fn seed_demo_data(db: &Database, covers: Option<&CoverStore>) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let mut ensure = |who: SeedUser| -> Result<User> {
        let (_, username, password, role) = USERS
            .iter()
            .find(|(w, ..)| *w == who)
            .ok_or_else(|| BooklogError::ConfigError("unknown seed user".into()))?;
        let (user, is_new) = ensure_user(db, username, password, *role)?;
        if is_new {
            report.users_created += 1;
        }
        Ok(user)
    };
    let users = SeededUsers {
        admin: ensure(SeedUser::Admin)?,
        author1: ensure(SeedUser::Author1)?,
        reader1: ensure(SeedUser::Reader1)?,
    };

    let conn = db.pool().get_connection();
    let books = SqliteBookRepository::new(&conn);
    let comments = SqliteCommentRepository::new(&conn);

    for seed in BOOKS {
        if books.find_by_title(seed.title)?.is_some() {
            continue;
        }
        let cover = match covers {
            Some(store) if !store.contains(seed.cover) => DEFAULT_COVER_URL,
            _ => seed.cover,
        };
        let draft = BookDraft::new(seed.title, seed.author_name)
            .with_genre(seed.genre)
            .with_description(seed.description)
            .with_cover(cover)
            .normalized()?;
        books.insert(users.get(seed.owner).id, &draft)?;
        report.books_created += 1;
    }

    for (title, who, content) in COMMENTS {
        let Some(book) = books.find_by_title(title)? else {
            continue;
        };
        let user_id = users.get(*who).id;
        if !comments.exists(book.id, user_id, content)? {
            comments.insert(book.id, user_id, content)?;
            report.comments_created += 1;
        }
    }

    tracing::info!(
        users = report.users_created,
        books = report.books_created,
        comments = report.comments_created,
        "demo data seeded"
    );
    Ok(report)
}
