//! Built-in datasets served when the upstream has nothing.

pub struct SeedArtist {
    pub id: &'static str,
    pub name: &'static str,
    pub image: &'static str,
}

pub struct SeedPlaylist {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub track_count: u32,
    pub image: &'static str,
}

pub struct SeedAlbum {
    pub id: &'static str,
    pub title: &'static str,
    pub artist: &'static str,
    pub image: &'static str,
}

pub struct SeedSingle {
    pub video_id: &'static str,
    pub title: &'static str,
    pub artist: &'static str,
    pub image: &'static str,
}

const fn artist(id: &'static str, name: &'static str, image: &'static str) -> SeedArtist {
    SeedArtist { id, name, image }
}

const fn playlist(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    track_count: u32,
    image: &'static str,
) -> SeedPlaylist {
    SeedPlaylist {
        id,
        title,
        description,
        track_count,
        image,
    }
}

const fn album(
    id: &'static str,
    title: &'static str,
    artist: &'static str,
    image: &'static str,
) -> SeedAlbum {
    SeedAlbum {
        id,
        title,
        artist,
        image,
    }
}

const fn single(
    video_id: &'static str,
    title: &'static str,
    artist: &'static str,
    image: &'static str,
) -> SeedSingle {
    SeedSingle {
        video_id,
        title,
        artist,
        image,
    }
}

/// Genre tables, in matching order.
pub const GENRE_ARTISTS: &[(&str, &[SeedArtist])] = &[
    (
        "pop",
        &[
            artist("pop1", "Taylor Swift", "https://i.scdn.co/image/ab6761610000e5eb6a224073987b930f99adc8bc"),
            artist("pop2", "Ed Sheeran", "https://i.scdn.co/image/ab6761610000e5eb3bcef85e105dfc42399ef0c2"),
            artist("pop3", "Ariana Grande", "https://i.scdn.co/image/ab6761610000e5ebcdce7620dc940db079bf4952"),
            artist("pop4", "Justin Bieber", "https://i.scdn.co/image/ab6761610000e5eb8ae7f2aaa9817a704a87ea36"),
        ],
    ),
    (
        "rock",
        &[
            artist("rock1", "Foo Fighters", "https://i.scdn.co/image/ab6761610000e5eb8b9e05bd676878c8861f7828"),
            artist("rock2", "Arctic Monkeys", "https://i.scdn.co/image/ab6761610000e5eb7da39dea0a72f581535fb11f"),
            artist("rock3", "Imagine Dragons", "https://i.scdn.co/image/ab6761610000e5eb920dc1f617550de8388f368e"),
            artist("rock4", "Twenty One Pilots", "https://i.scdn.co/image/ab6761610000e5eba53ac4a3e0240306c2c33bae"),
        ],
    ),
    (
        "hip hop",
        &[
            artist("hiphop1", "Kendrick Lamar", "https://i.scdn.co/image/ab6761610000e5eb6eb08a5d2495d9f7d429aee9"),
            artist("hiphop2", "Drake", "https://i.scdn.co/image/ab6761610000e5eb4293385d324db8558179afd9"),
            artist("hiphop3", "J. Cole", "https://i.scdn.co/image/ab6761610000e5ebadd503b411a712e277895c8a"),
            artist("hiphop4", "Travis Scott", "https://i.scdn.co/image/ab6761610000e5eba00b11c129b27a88fc72f36b"),
        ],
    ),
    (
        "electronic",
        &[
            artist("edm1", "Calvin Harris", "https://i.scdn.co/image/ab6761610000e5ebc2b305a3560d6708dd8b7de0"),
            artist("edm2", "Martin Garrix", "https://i.scdn.co/image/ab6761610000e5eb12a2ef08d00dd7451a6dbed6"),
            artist("edm3", "Daft Punk", "https://i.scdn.co/image/ab6761610000e5eb10ca40ea0b0b5082dba0ff75"),
            artist("edm4", "Avicii", "https://i.scdn.co/image/ab6761610000e5ebd212fe90e871fa11c232c3a6"),
        ],
    ),
    (
        "indie",
        &[
            artist("indie1", "Tame Impala", "https://i.scdn.co/image/ab6761610000e5ebf87efa01ac7680a3fa7d0987"),
            artist("indie2", "The 1975", "https://i.scdn.co/image/ab6761610000e5eb8197fc99bf4768c774d18c55"),
            artist("indie3", "Vampire Weekend", "https://i.scdn.co/image/ab6761610000e5eb809b75d71c5e258695cef8c4"),
            artist("indie4", "MGMT", "https://i.scdn.co/image/ab6761610000e5eb68151ade82ce461f9f761a5e"),
        ],
    ),
];

/// `(region, genre)` overrides placed ahead of the genre table.
pub const REGION_ARTISTS: &[(&str, &str, &[SeedArtist])] = &[
    (
        "ES",
        "pop",
        &[
            artist("es-pop1", "Rosalía", "https://i.scdn.co/image/ab6761610000e5eb4a5844d12a6633fcce886ce2"),
            artist("es-pop2", "Aitana", "https://i.scdn.co/image/ab6761610000e5eb1af3fabbe3738a589d6f45de"),
            artist("es-pop3", "Pablo Alborán", "https://i.scdn.co/image/ab6761610000e5eb996e3a6acf0b2bec97b29f34"),
        ],
    ),
    (
        "ES",
        "rock",
        &[
            artist("es-rock1", "Leiva", "https://i.scdn.co/image/ab6761610000e5eb1f3c2b9c5fafe47fdb6dd2e3"),
            artist("es-rock2", "Izal", "https://i.scdn.co/image/ab6761610000e5eb32d0c0c92328b225d069534a"),
        ],
    ),
    (
        "MX",
        "pop",
        &[
            artist("mx-pop1", "Natalia Lafourcade", "https://i.scdn.co/image/ab6761610000e5eb9c0ac81650538c3a3f5c5536"),
            artist("mx-pop2", "Reik", "https://i.scdn.co/image/ab6761610000e5eba09a439764e2c2d5eb517de1"),
            artist("mx-pop3", "Jesse & Joy", "https://i.scdn.co/image/ab6761610000e5eba8c8f89da7b1c1fcc9e1c92e"),
        ],
    ),
    (
        "AR",
        "pop",
        &[
            artist("ar-pop1", "Tini", "https://i.scdn.co/image/ab6761610000e5ebb6a2c7d2a2b38be4f4ede430"),
            artist("ar-pop2", "Lali", "https://i.scdn.co/image/ab6761610000e5eb1e34e6df777e8d4bd0269ed7"),
            artist("ar-pop3", "Nicki Nicole", "https://i.scdn.co/image/ab6761610000e5eb21128629ebdb8ac427228921"),
        ],
    ),
];

pub const REGION_PLAYLISTS: &[(&str, &[SeedPlaylist])] = &[
    (
        "ES",
        &[
            playlist("ES_top_hits", "Éxitos España", "Los éxitos más populares en España", 50, "https://i.ytimg.com/vi/p7bfOZek9t4/maxresdefault.jpg"),
            playlist("ES_flamenco", "Flamenco Fusion", "Lo mejor del flamenco fusión", 30, "https://i.ytimg.com/vi/qmbx4_TQbkA/maxresdefault.jpg"),
        ],
    ),
    (
        "MX",
        &[
            playlist("MX_regional", "Regional Mexicano", "Lo mejor de la música regional mexicana", 40, "https://i.ytimg.com/vi/NGZ-xIDBiCs/maxresdefault.jpg"),
            playlist("MX_pop", "Pop Latino México", "El pop más escuchado en México", 45, "https://i.ytimg.com/vi/MBmb5_TTT-w/maxresdefault.jpg"),
        ],
    ),
    (
        "AR",
        &[playlist("AR_trap", "Trap Argentino", "El mejor trap de Argentina", 40, "https://i.ytimg.com/vi/3V-bu_i-w_o/maxresdefault.jpg")],
    ),
];

pub const GLOBAL_PLAYLISTS: &[SeedPlaylist] = &[
    playlist("PL55713C70BA91BD6E", "Top Hits Globales", "Los éxitos más populares del momento", 50, "https://i.ytimg.com/vi/kJQP7kiw5Fk/maxresdefault.jpg"),
    playlist("PL4fGSI1pDJn6jXS_Tv_N9B8Z0HTRVJE0n", "Éxitos Latinos", "Lo mejor de la música latina", 40, "https://i.ytimg.com/vi/TmKh7lAwnBI/maxresdefault.jpg"),
    playlist("PLgzTt0k8mXzEk586ze4BjvDXR7c-TUSnx", "Acoustic Chill", "Música acústica para relajarte", 35, "https://i.ytimg.com/vi/jTLhQf5KJSc/maxresdefault.jpg"),
    playlist("PL4o29bINVT4EG_y-k5jGoOu3-Am8Nvi10", "Workout Hits", "Música para entrenar", 45, "https://i.ytimg.com/vi/pRpeEdMmmQ0/maxresdefault.jpg"),
    playlist("PL4fGSI1pDJn5kI81J1fYWK5eZRl1zJ5kM", "Indie Discoveries", "Descubre nuevas bandas indie", 30, "https://i.ytimg.com/vi/8SbUC-UaAxE/maxresdefault.jpg"),
];

pub const REGION_ALBUMS: &[(&str, &[SeedAlbum])] = &[
    (
        "ES",
        &[
            album("yt-album-es-1", "El Madrileño", "C. Tangana", "https://i.ytimg.com/vi/7Z2XmgX-jjE/maxresdefault.jpg"),
            album("yt-album-es-2", "Vibras", "J Balvin", "https://i.ytimg.com/vi/0MpFSsP9rIM/maxresdefault.jpg"),
        ],
    ),
    (
        "MX",
        &[
            album("yt-album-mx-1", "Un Canto por México", "Natalia Lafourcade", "https://i.ytimg.com/vi/F0IjuWLTuZM/maxresdefault.jpg"),
            album("yt-album-mx-2", "Mañana Será Bonito", "Karol G", "https://i.ytimg.com/vi/sqj6yUQyGmw/maxresdefault.jpg"),
        ],
    ),
    (
        "AR",
        &[album("yt-album-ar-1", "Bzrp Music Sessions", "Bizarrap", "https://i.ytimg.com/vi/3nQNiWdeH2Q/maxresdefault.jpg")],
    ),
];

pub const GLOBAL_ALBUMS: &[SeedAlbum] = &[
    album("yt-album-1", "Future Nostalgia (2025 Edition)", "Dua Lipa", "https://i.ytimg.com/vi/WHuBW3qKm9g/maxresdefault.jpg"),
    album("yt-album-2", "Un Verano Sin Ti (Deluxe)", "Bad Bunny", "https://i.ytimg.com/vi/1TCX_Aqzoo4/maxresdefault.jpg"),
    album("yt-album-3", "After Hours (Extended Version)", "The Weeknd", "https://i.ytimg.com/vi/XXYlFuWEuKI/maxresdefault.jpg"),
    album("yt-album-4", "Harry's House (Expanded Edition)", "Harry Styles", "https://i.ytimg.com/vi/H5v3kku4y6Q/maxresdefault.jpg"),
    album("yt-album-5", "Midnights (The Complete Collection)", "Taylor Swift", "https://i.ytimg.com/vi/b1kbLwvqugk/maxresdefault.jpg"),
];

pub const REGION_SINGLES: &[(&str, &[SeedSingle])] = &[
    (
        "US",
        &[single("us_pop_1", "US Pop Hit 1", "US Artist 1", "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")],
    ),
    (
        "ES",
        &[single("es_pop_1", "Hit Latino 1", "Artista Latino 1", "https://i.ytimg.com/vi/kJQP7kiw5Fk/maxresdefault.jpg")],
    ),
];

pub const GLOBAL_SINGLES: &[SeedSingle] = &[
    single("global_pop_1", "Global Hit 1", "Global Artist 1", "https://i.ytimg.com/vi/JGwWNGJdvx8/maxresdefault.jpg"),
    single("global_pop_2", "Global Hit 2", "Global Artist 2", "https://i.ytimg.com/vi/3tmd-ClpJxA/maxresdefault.jpg"),
];

/// Genres cycled through by the synthetic top-artist list.
pub const TOP_ARTIST_GENRES: &[&str] = &["pop", "rock", "hip hop", "electronic", "latin"];
